//! Regulatory limits and classification rules (Res. Exenta 3612/09)
//!
//! Every threshold used by the schema views lives here as a named constant,
//! and every CASE expression in the views has a pure-Rust twin in this
//! module. The view DDL in `db` interpolates these constants, so the SQL
//! and Rust rules always agree.

use serde::Serialize;

// ============================================================================
// Regulatory limits
// ============================================================================

/// Maximum total organic matter (%) under the standard INFA protocol
pub const MOT_MAX_INFA: f64 = 9.0;
/// Maximum total organic matter (%) under INFA-POSTANAEROBICA
pub const MOT_MAX_POST: f64 = 8.0;

/// Minimum sediment pH, both protocols
pub const PH_MIN: f64 = 7.1;

/// Minimum redox potential (mV, Eh) under INFA
pub const REDOX_MIN_INFA: f64 = 50.0;
/// Minimum redox potential (mV, Eh) under INFA-POSTANAEROBICA
pub const REDOX_MIN_POST: f64 = 75.0;

/// Minimum dissolved oxygen (mg/L) at the Z-1 layer under INFA
pub const OXIGENO_MIN_INFA: f64 = 2.5;
/// Minimum dissolved oxygen (mg/L) at the Z-1 layer under INFA-POSTANAEROBICA
pub const OXIGENO_MIN_POST: f64 = 3.0;

// Advisory thresholds. Values past these are stored anyway and surfaced by
// the integrity queries for human review.
pub const MOT_WARNING: f64 = 50.0;
pub const OXIGENO_WARNING: f64 = 12.0;

// Oxygen severity bands, independent of protocol
pub const OXIGENO_BANDA_CRITICO: f64 = 2.0;
pub const OXIGENO_BANDA_BAJO: f64 = 3.0;
pub const OXIGENO_BANDA_MODERADO: f64 = 5.0;

// Extraction-quality grading (completeness %)
pub const COMPLETITUD_EXCELENTE: f64 = 95.0;
pub const COMPLETITUD_BUENO: f64 = 80.0;
pub const COMPLETITUD_REGULAR: f64 = 60.0;

// Valid UTM envelope for the monitored zone
pub const UTM_ESTE_MIN: i32 = 166_021;
pub const UTM_ESTE_MAX: i32 = 833_978;
pub const UTM_NORTE_MIN: i32 = 1_116_915;
pub const UTM_NORTE_MAX: i32 = 10_000_000;

// ============================================================================
// Closed vocabularies
// ============================================================================

/// Monitoring protocol attached to a work order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TipoMonitoreo {
    Infa,
    InfaPostanaerobica,
    /// Pre-seeding survey; compliance limits do not apply
    Cps,
}

impl TipoMonitoreo {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoMonitoreo::Infa => "INFA",
            TipoMonitoreo::InfaPostanaerobica => "INFA-POSTANAEROBICA",
            TipoMonitoreo::Cps => "CPS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INFA" => Some(TipoMonitoreo::Infa),
            "INFA-POSTANAEROBICA" => Some(TipoMonitoreo::InfaPostanaerobica),
            "CPS" => Some(TipoMonitoreo::Cps),
            _ => None,
        }
    }

    /// MOT limit (%) for this protocol, None when limits do not apply
    pub fn mot_maximo(&self) -> Option<f64> {
        match self {
            TipoMonitoreo::Infa => Some(MOT_MAX_INFA),
            TipoMonitoreo::InfaPostanaerobica => Some(MOT_MAX_POST),
            TipoMonitoreo::Cps => None,
        }
    }

    /// Z-1 dissolved-oxygen limit (mg/L) for this protocol
    pub fn oxigeno_minimo(&self) -> Option<f64> {
        match self {
            TipoMonitoreo::Infa => Some(OXIGENO_MIN_INFA),
            TipoMonitoreo::InfaPostanaerobica => Some(OXIGENO_MIN_POST),
            TipoMonitoreo::Cps => None,
        }
    }

    /// Redox (Eh) limit in mV for this protocol
    pub fn redox_minimo(&self) -> Option<f64> {
        match self {
            TipoMonitoreo::Infa => Some(REDOX_MIN_INFA),
            TipoMonitoreo::InfaPostanaerobica => Some(REDOX_MIN_POST),
            TipoMonitoreo::Cps => None,
        }
    }
}

/// Report type of a work order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TipoInforme {
    Sedimento,
    Oxigeno,
    Visual,
    Mixto,
}

impl TipoInforme {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoInforme::Sedimento => "SEDIMENTO",
            TipoInforme::Oxigeno => "OXIGENO",
            TipoInforme::Visual => "VISUAL",
            TipoInforme::Mixto => "MIXTO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SEDIMENTO" => Some(TipoInforme::Sedimento),
            "OXIGENO" => Some(TipoInforme::Oxigeno),
            "VISUAL" => Some(TipoInforme::Visual),
            "MIXTO" => Some(TipoInforme::Mixto),
            _ => None,
        }
    }
}

/// Aerobic/anaerobic condition of a site at sampling time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CondicionCentro {
    Aerobico,
    Anaerobico,
}

impl CondicionCentro {
    pub fn as_str(&self) -> &'static str {
        match self {
            CondicionCentro::Aerobico => "AEROBICO",
            CondicionCentro::Anaerobico => "ANAEROBICO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AEROBICO" => Some(CondicionCentro::Aerobico),
            "ANAEROBICO" => Some(CondicionCentro::Anaerobico),
            _ => None,
        }
    }
}

/// Seabed substrate observed on a visual transect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sustrato {
    Duro,
    Blando,
    Mixto,
}

impl Sustrato {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sustrato::Duro => "Duro",
            Sustrato::Blando => "Blando",
            Sustrato::Mixto => "Mixto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Duro" => Some(Sustrato::Duro),
            "Blando" => Some(Sustrato::Blando),
            "Mixto" => Some(Sustrato::Mixto),
            _ => None,
        }
    }
}

/// Severity of a processing-log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NivelLog {
    Info,
    Warning,
    Error,
    Debug,
}

impl NivelLog {
    pub fn as_str(&self) -> &'static str {
        match self {
            NivelLog::Info => "INFO",
            NivelLog::Warning => "WARNING",
            NivelLog::Error => "ERROR",
            NivelLog::Debug => "DEBUG",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INFO" => Some(NivelLog::Info),
            "WARNING" => Some(NivelLog::Warning),
            "ERROR" => Some(NivelLog::Error),
            "DEBUG" => Some(NivelLog::Debug),
            _ => None,
        }
    }
}

/// Six-symbol abundance vocabulary used on visual transects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodigoAbundancia {
    Raro,
    Escaso,
    Moderado,
    Abundante,
    MuyAbundante,
    Ausente,
}

impl CodigoAbundancia {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodigoAbundancia::Raro => "R",
            CodigoAbundancia::Escaso => "E",
            CodigoAbundancia::Moderado => "M",
            CodigoAbundancia::Abundante => "A",
            CodigoAbundancia::MuyAbundante => "MA",
            CodigoAbundancia::Ausente => "-",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "R" => Some(CodigoAbundancia::Raro),
            "E" => Some(CodigoAbundancia::Escaso),
            "M" => Some(CodigoAbundancia::Moderado),
            "A" => Some(CodigoAbundancia::Abundante),
            "MA" => Some(CodigoAbundancia::MuyAbundante),
            "-" => Some(CodigoAbundancia::Ausente),
            _ => None,
        }
    }

    /// Human label with the individual-count range, as published in reports
    pub fn etiqueta(&self) -> &'static str {
        match self {
            CodigoAbundancia::Raro => "Raro (1-2)",
            CodigoAbundancia::Escaso => "Escaso (3-5)",
            CodigoAbundancia::Moderado => "Moderado (6-10)",
            CodigoAbundancia::Abundante => "Abundante (11-20)",
            CodigoAbundancia::MuyAbundante => "Muy Abundante (>20)",
            CodigoAbundancia::Ausente => "Ausente (0)",
        }
    }

    /// Individual-count range implied by the code (max None = open-ended)
    pub fn rango(&self) -> (i32, Option<i32>) {
        match self {
            CodigoAbundancia::Raro => (1, Some(2)),
            CodigoAbundancia::Escaso => (3, Some(5)),
            CodigoAbundancia::Moderado => (6, Some(10)),
            CodigoAbundancia::Abundante => (11, Some(20)),
            CodigoAbundancia::MuyAbundante => (21, None),
            CodigoAbundancia::Ausente => (0, Some(0)),
        }
    }
}

// ============================================================================
// Classification results
// ============================================================================

/// Outcome of a compliance classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cumplimiento {
    Cumple,
    NoCumple,
    /// Protocol without applicable limits (CPS) or value not measured
    NoAplica,
}

impl Cumplimiento {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cumplimiento::Cumple => "CUMPLE",
            Cumplimiento::NoCumple => "NO CUMPLE",
            Cumplimiento::NoAplica => "NO APLICA",
        }
    }
}

/// Oxygen severity band, independent of protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BandaOxigeno {
    Critico,
    Bajo,
    Moderado,
    Bueno,
}

impl BandaOxigeno {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandaOxigeno::Critico => "CRITICO",
            BandaOxigeno::Bajo => "BAJO",
            BandaOxigeno::Moderado => "MODERADO",
            BandaOxigeno::Bueno => "BUENO",
        }
    }
}

/// Grade assigned to an extraction run from its completeness percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalidadExtraccion {
    Excelente,
    Bueno,
    Regular,
    Deficiente,
}

impl CalidadExtraccion {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalidadExtraccion::Excelente => "EXCELENTE",
            CalidadExtraccion::Bueno => "BUENO",
            CalidadExtraccion::Regular => "REGULAR",
            CalidadExtraccion::Deficiente => "DEFICIENTE",
        }
    }
}

// ============================================================================
// Classification functions
// ============================================================================

/// Classify a MOT percentage against the protocol limit
pub fn clasificar_mot(protocolo: TipoMonitoreo, mot_porcentaje: f64) -> Cumplimiento {
    match protocolo.mot_maximo() {
        Some(limite) if mot_porcentaje <= limite => Cumplimiento::Cumple,
        Some(_) => Cumplimiento::NoCumple,
        None => Cumplimiento::NoAplica,
    }
}

/// Classify a Z-1 dissolved-oxygen value against the protocol limit
pub fn clasificar_oxigeno(protocolo: TipoMonitoreo, oxigeno_mg_l: f64) -> Cumplimiento {
    match protocolo.oxigeno_minimo() {
        Some(limite) if oxigeno_mg_l >= limite => Cumplimiento::Cumple,
        Some(_) => Cumplimiento::NoCumple,
        None => Cumplimiento::NoAplica,
    }
}

/// Severity band for a dissolved-oxygen value
pub fn banda_oxigeno(oxigeno_mg_l: f64) -> BandaOxigeno {
    if oxigeno_mg_l < OXIGENO_BANDA_CRITICO {
        BandaOxigeno::Critico
    } else if oxigeno_mg_l < OXIGENO_BANDA_BAJO {
        BandaOxigeno::Bajo
    } else if oxigeno_mg_l < OXIGENO_BANDA_MODERADO {
        BandaOxigeno::Moderado
    } else {
        BandaOxigeno::Bueno
    }
}

/// Human label for an abundance code; unrecognized codes map to the fallback
pub fn etiqueta_abundancia(codigo: &str) -> &'static str {
    match CodigoAbundancia::parse(codigo) {
        Some(c) => c.etiqueta(),
        None => "No Determinado",
    }
}

/// Grade an extraction run from its completeness percentage (boundaries
/// inclusive: 95.0 is EXCELENTE, 80.0 is BUENO, 60.0 is REGULAR)
pub fn calidad_extraccion(porcentaje_completitud: f64) -> CalidadExtraccion {
    if porcentaje_completitud >= COMPLETITUD_EXCELENTE {
        CalidadExtraccion::Excelente
    } else if porcentaje_completitud >= COMPLETITUD_BUENO {
        CalidadExtraccion::Bueno
    } else if porcentaje_completitud >= COMPLETITUD_REGULAR {
        CalidadExtraccion::Regular
    } else {
        CalidadExtraccion::Deficiente
    }
}

/// pH compliance (same floor for both protocols)
pub fn cumple_ph(ph: f64) -> bool {
    ph >= PH_MIN
}

/// Redox compliance against the protocol floor, None for CPS
pub fn cumple_redox(protocolo: TipoMonitoreo, eh_mv: f64) -> Option<bool> {
    protocolo.redox_minimo().map(|limite| eh_mv >= limite)
}

/// MOT compliance against the INFA ceiling
pub fn cumple_mot_infa(mot_porcentaje: f64) -> bool {
    mot_porcentaje <= MOT_MAX_INFA
}

/// MOT compliance against the post-anaerobic ceiling
pub fn cumple_mot_post(mot_porcentaje: f64) -> bool {
    mot_porcentaje <= MOT_MAX_POST
}

/// Joint pH/redox compliance: both must pass. None for CPS or when either
/// reading is missing.
pub fn cumple_conjunto(
    protocolo: TipoMonitoreo,
    ph: Option<f64>,
    eh_mv: Option<f64>,
) -> Option<bool> {
    let ph_ok = cumple_ph(ph?);
    let redox_ok = cumple_redox(protocolo, eh_mv?)?;
    Some(ph_ok && redox_ok)
}
