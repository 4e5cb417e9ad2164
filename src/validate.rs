//! Post-load integrity checks
//!
//! The CHECK constraints in `db` reject bad rows at write time; this module
//! sweeps an existing database for problems those constraints cannot see or
//! that predate them: orphaned children in files written by other tools,
//! out-of-range values, missing data the schema allows as NULL, and soft
//! anomalies that are legal but suspicious (an organic-matter reading above
//! 50% almost always means the extractor read the wrong column).
//!
//! Checks are read-only, so running them twice in a row yields the same
//! report.

use crate::db::{Database, Result};
use crate::limits::{MOT_WARNING, OXIGENO_WARNING};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use log::{debug, warn};

/// Tolerance when comparing a stored station average against the average
/// recomputed from its replicates. Source documents round to one decimal.
const TOLERANCIA_PROMEDIO: f64 = 0.1;

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

/// Orphaned rows in one child table
#[derive(Debug, Clone, serde::Serialize)]
pub struct Huerfanos {
    pub tabla: String,
    pub filas: i64,
}

/// Rows violating a physical range in one column
#[derive(Debug, Clone, serde::Serialize)]
pub struct FueraDeRango {
    pub tabla: String,
    pub columna: String,
    pub filas: i64,
}

/// NULLs in columns that are expected to carry data
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatosFaltantes {
    /// MOT replicates with no percentage
    pub mot_sin_valor: i64,
    /// Z-1 layers with no oxygen reading
    pub z1_sin_oxigeno: i64,
    /// Work orders without a sampling date
    pub ots_sin_fecha: i64,
    /// Work orders not attached to any centro
    pub ots_sin_centro: i64,
}

/// Legal but suspicious values, flagged for manual review
#[derive(Debug, Clone, serde::Serialize)]
pub struct Anomalias {
    /// MOT readings above the plausibility warning threshold
    pub mot_sobre_advertencia: i64,
    /// Oxygen readings above the plausibility warning threshold
    pub oxigeno_sobre_advertencia: i64,
    /// Stations whose stored average disagrees with their replicates
    pub promedios_inconsistentes: i64,
    /// Stations where the MOT and pH/redox series cover different replica sets
    pub replicas_desparejadas: i64,
}

/// Source file ranked by ERROR entries in the processing log
#[derive(Debug, Clone, serde::Serialize, QueryableByName)]
pub struct FocoErrores {
    #[diesel(sql_type = Nullable<Text>)]
    pub archivo_origen: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub errores: i64,
}

/// Full integrity sweep result
#[derive(Debug, Clone, serde::Serialize)]
pub struct IntegrityReport {
    pub huerfanos: Vec<Huerfanos>,
    pub fuera_de_rango: Vec<FueraDeRango>,
    pub datos_faltantes: DatosFaltantes,
    pub anomalias: Anomalias,
    pub focos_errores: Vec<FocoErrores>,
}

impl IntegrityReport {
    /// True when no hard problem was found. Missing data and soft anomalies
    /// do not make a database dirty; orphans and range violations do.
    pub fn is_clean(&self) -> bool {
        self.huerfanos.is_empty() && self.fuera_de_rango.is_empty()
    }
}

/// Parent/child pairs swept for orphans, child-side FK column included
const ORPHAN_CHECKS: &[(&str, &str, &str, &str)] = &[
    ("ordenes_trabajo", "centro_id", "centros", "centro_id"),
    ("sedimento_estaciones", "ot_id", "ordenes_trabajo", "ot_id"),
    ("sedimento_materia_organica", "estacion_id", "sedimento_estaciones", "estacion_id"),
    ("sedimento_ph_redox", "estacion_id", "sedimento_estaciones", "estacion_id"),
    ("oxigeno_perfiles", "ot_id", "ordenes_trabajo", "ot_id"),
    ("oxigeno_mediciones", "perfil_id", "oxigeno_perfiles", "perfil_id"),
    ("registro_visual_transectas", "ot_id", "ordenes_trabajo", "ot_id"),
    ("registro_visual_abundancia", "transecta_id", "registro_visual_transectas", "transecta_id"),
    ("auditoria_extraccion", "ot_id", "ordenes_trabajo", "ot_id"),
];

/// Physical ranges re-checked as a sweep. Mirrors the table CHECKs so the
/// report catches databases written without them.
const RANGE_CHECKS: &[(&str, &str, &str)] = &[
    ("sedimento_materia_organica", "mot_porcentaje", "mot_porcentaje NOT BETWEEN 0 AND 100"),
    ("sedimento_materia_organica", "replica", "replica NOT BETWEEN 1 AND 10"),
    ("sedimento_ph_redox", "ph", "ph NOT BETWEEN 0 AND 14"),
    ("sedimento_ph_redox", "potencial_redox_mv", "potencial_redox_mv NOT BETWEEN -500 AND 500"),
    ("sedimento_ph_redox", "temperatura_c", "temperatura_c NOT BETWEEN 5 AND 20"),
    ("oxigeno_mediciones", "oxigeno_mg_l", "oxigeno_mg_l NOT BETWEEN 0 AND 15"),
    ("oxigeno_mediciones", "temperatura_c", "temperatura_c NOT BETWEEN 5 AND 20"),
    ("oxigeno_mediciones", "salinidad_psu", "salinidad_psu NOT BETWEEN 0 AND 40"),
    ("oxigeno_mediciones", "saturacion_pct", "saturacion_pct NOT BETWEEN 0 AND 200"),
    ("centros", "categoria", "categoria NOT BETWEEN 1 AND 5"),
];

fn count(db: &Database, sql: &str) -> Result<i64> {
    let mut conn = db.get_conn()?;
    let row: CountRow = diesel::sql_query(sql).get_result(&mut conn)?;
    Ok(row.n)
}

fn orphans(db: &Database) -> Result<Vec<Huerfanos>> {
    let mut out = Vec::new();
    for (child, fk, parent, pk) in ORPHAN_CHECKS {
        let n = count(
            db,
            &format!(
                "SELECT COUNT(*) AS n FROM {child} c \
                 WHERE c.{fk} IS NOT NULL \
                 AND NOT EXISTS (SELECT 1 FROM {parent} p WHERE p.{pk} = c.{fk})"
            ),
        )?;
        if n > 0 {
            warn!("{} filas huerfanas en {}", n, child);
            out.push(Huerfanos {
                tabla: (*child).to_owned(),
                filas: n,
            });
        }
    }
    Ok(out)
}

fn out_of_range(db: &Database) -> Result<Vec<FueraDeRango>> {
    let mut out = Vec::new();
    for (tabla, columna, predicado) in RANGE_CHECKS {
        let n = count(
            db,
            &format!("SELECT COUNT(*) AS n FROM {tabla} WHERE {predicado}"),
        )?;
        if n > 0 {
            warn!("{} filas fuera de rango en {}.{}", n, tabla, columna);
            out.push(FueraDeRango {
                tabla: (*tabla).to_owned(),
                columna: (*columna).to_owned(),
                filas: n,
            });
        }
    }
    Ok(out)
}

fn missing_data(db: &Database) -> Result<DatosFaltantes> {
    Ok(DatosFaltantes {
        mot_sin_valor: count(
            db,
            "SELECT COUNT(*) AS n FROM sedimento_materia_organica \
             WHERE mot_porcentaje IS NULL",
        )?,
        z1_sin_oxigeno: count(
            db,
            "SELECT COUNT(*) AS n FROM oxigeno_mediciones \
             WHERE es_capa_z1 = 1 AND oxigeno_mg_l IS NULL",
        )?,
        ots_sin_fecha: count(
            db,
            "SELECT COUNT(*) AS n FROM ordenes_trabajo WHERE fecha_muestreo IS NULL",
        )?,
        ots_sin_centro: count(
            db,
            "SELECT COUNT(*) AS n FROM ordenes_trabajo WHERE centro_id IS NULL",
        )?,
    })
}

fn anomalies(db: &Database) -> Result<Anomalias> {
    Ok(Anomalias {
        mot_sobre_advertencia: count(
            db,
            &format!(
                "SELECT COUNT(*) AS n FROM sedimento_materia_organica \
                 WHERE mot_porcentaje > {MOT_WARNING}"
            ),
        )?,
        oxigeno_sobre_advertencia: count(
            db,
            &format!(
                "SELECT COUNT(*) AS n FROM oxigeno_mediciones \
                 WHERE oxigeno_mg_l > {OXIGENO_WARNING}"
            ),
        )?,
        promedios_inconsistentes: count(
            db,
            &format!(
                "SELECT COUNT(*) AS n FROM ( \
                   SELECT estacion_id FROM sedimento_materia_organica \
                   WHERE promedio_estacion IS NOT NULL AND mot_porcentaje IS NOT NULL \
                   GROUP BY estacion_id \
                   HAVING ABS(MAX(promedio_estacion) - AVG(mot_porcentaje)) > {TOLERANCIA_PROMEDIO} \
                 )"
            ),
        )?,
        replicas_desparejadas: count(
            db,
            "SELECT COUNT(*) AS n FROM sedimento_estaciones e \
             WHERE EXISTS (SELECT 1 FROM sedimento_materia_organica m \
                           WHERE m.estacion_id = e.estacion_id) \
             AND EXISTS (SELECT 1 FROM sedimento_ph_redox p \
                         WHERE p.estacion_id = e.estacion_id) \
             AND (EXISTS (SELECT replica FROM sedimento_materia_organica m \
                          WHERE m.estacion_id = e.estacion_id \
                          EXCEPT SELECT replica FROM sedimento_ph_redox p \
                          WHERE p.estacion_id = e.estacion_id) \
                  OR EXISTS (SELECT replica FROM sedimento_ph_redox p \
                             WHERE p.estacion_id = e.estacion_id \
                             EXCEPT SELECT replica FROM sedimento_materia_organica m \
                             WHERE m.estacion_id = e.estacion_id))",
        )?,
    })
}

fn error_hotspots(db: &Database) -> Result<Vec<FocoErrores>> {
    let mut conn = db.get_conn()?;
    let rows = diesel::sql_query(
        "SELECT archivo_origen, COUNT(*) AS errores FROM log_procesamiento \
         WHERE nivel = 'ERROR' \
         GROUP BY archivo_origen \
         ORDER BY errores DESC, archivo_origen \
         LIMIT 10",
    )
    .load::<FocoErrores>(&mut conn)?;
    Ok(rows)
}

/// Run every integrity check against an open database
pub fn check(db: &Database) -> Result<IntegrityReport> {
    debug!("ejecutando chequeos de integridad");
    Ok(IntegrityReport {
        huerfanos: orphans(db)?,
        fuera_de_rango: out_of_range(db)?,
        datos_faltantes: missing_data(db)?,
        anomalias: anomalies(db)?,
        focos_errores: error_hotspots(db)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        Database, NewCentro, NewEstacion, NewMateriaOrganica, NewMedicionOxigeno,
        NewOrdenTrabajo, NewPerfil,
    };
    use crate::limits::{NivelLog, TipoMonitoreo};

    fn fixture() -> (Database, i32) {
        let db = Database::open_in_memory().expect("in-memory database");
        db.insert_centro(&NewCentro {
            codigo_centro: "C-1",
            nombre_centro: "CENTRO TEST",
            categoria: Some(2),
            region: Some("Aysen"),
            utm_este: None,
            utm_norte: None,
            es_censurado: 0,
        })
        .expect("centro");
        let centro = db.get_centro("C-1").expect("get").expect("exists");
        let ot = db
            .insert_orden_trabajo(&NewOrdenTrabajo {
                codigo_ot: "OT-1",
                centro_id: Some(centro.centro_id),
                tipo_informe: "MIXTO",
                tipo_monitoreo: TipoMonitoreo::Infa.as_str(),
                fecha_muestreo: Some("2024-05-02"),
                condicion_centro: "AEROBICO",
                numero_incumplimientos: 0,
                requiere_revision: 0,
                archivo_pdf_original: None,
            })
            .expect("orden");
        (db, ot)
    }

    #[test]
    fn test_clean_database() {
        let (db, _) = fixture();
        let report = check(&db).expect("check");
        assert!(report.is_clean());
        assert!(report.huerfanos.is_empty());
        assert!(report.fuera_de_rango.is_empty());
        assert_eq!(report.anomalias.mot_sobre_advertencia, 0);
        assert_eq!(report.datos_faltantes.ots_sin_centro, 0);
    }

    #[test]
    fn test_check_is_idempotent() {
        let (db, _) = fixture();
        let a = check(&db).expect("first run");
        let b = check(&db).expect("second run");
        assert_eq!(a.is_clean(), b.is_clean());
        assert_eq!(
            a.datos_faltantes.ots_sin_fecha,
            b.datos_faltantes.ots_sin_fecha
        );
        assert_eq!(a.focos_errores.len(), b.focos_errores.len());
    }

    #[test]
    fn test_orphans_detected() {
        let (db, _) = fixture();

        // Rows written by another tool with enforcement off
        {
            let mut conn = db.get_conn().expect("conn");
            diesel::sql_query("PRAGMA foreign_keys = OFF")
                .execute(&mut conn)
                .expect("pragma off");
            diesel::sql_query(
                "INSERT INTO sedimento_estaciones (ot_id, codigo_estacion) \
                 VALUES (9999, 'EX')",
            )
            .execute(&mut conn)
            .expect("orphan estacion");
            diesel::sql_query(
                "INSERT INTO oxigeno_mediciones (perfil_id, numero_capa, es_capa_z1) \
                 VALUES (9999, 1, 0)",
            )
            .execute(&mut conn)
            .expect("orphan medicion");
            diesel::sql_query("PRAGMA foreign_keys = ON")
                .execute(&mut conn)
                .expect("pragma on");
        }

        let report = check(&db).expect("check");
        assert!(!report.is_clean());
        assert_eq!(report.huerfanos.len(), 2);
        let filas = |tabla: &str| {
            report
                .huerfanos
                .iter()
                .find(|h| h.tabla == tabla)
                .map(|h| h.filas)
        };
        assert_eq!(filas("sedimento_estaciones"), Some(1));
        assert_eq!(filas("oxigeno_mediciones"), Some(1));
    }

    #[test]
    fn test_missing_data_counts() {
        let (db, ot) = fixture();
        let est = db
            .insert_estacion(&NewEstacion {
                ot_id: ot,
                codigo_estacion: "E1",
                utm_este: None,
                utm_norte: None,
                profundidad_m: None,
            })
            .expect("estacion");
        db.insert_materia_organica(&NewMateriaOrganica {
            estacion_id: est,
            codigo_muestra: None,
            replica: 1,
            peso_muestra_g: None,
            mot_porcentaje: None,
            promedio_estacion: None,
            cumple_limite_infa: None,
            cumple_limite_post: None,
        })
        .expect("mot sin valor");

        db.insert_orden_trabajo(&NewOrdenTrabajo {
            codigo_ot: "OT-HUERFANA",
            centro_id: None,
            tipo_informe: "OXIGENO",
            tipo_monitoreo: "INFA",
            fecha_muestreo: None,
            condicion_centro: "AEROBICO",
            numero_incumplimientos: 0,
            requiere_revision: 0,
            archivo_pdf_original: None,
        })
        .expect("ot sin centro");

        let report = check(&db).expect("check");
        assert_eq!(report.datos_faltantes.mot_sin_valor, 1);
        assert_eq!(report.datos_faltantes.ots_sin_centro, 1);
        assert_eq!(report.datos_faltantes.ots_sin_fecha, 1);
        // NULLs are missing data, not dirt
        assert!(report.is_clean());
    }

    #[test]
    fn test_soft_anomalies() {
        let (db, ot) = fixture();
        let est = db
            .insert_estacion(&NewEstacion {
                ot_id: ot,
                codigo_estacion: "E1",
                utm_este: None,
                utm_norte: None,
                profundidad_m: Some(30.0),
            })
            .expect("estacion");

        // Legal (<= 100) but implausible
        db.insert_materia_organica(&NewMateriaOrganica {
            estacion_id: est,
            codigo_muestra: None,
            replica: 1,
            peso_muestra_g: Some(9.8),
            mot_porcentaje: Some(72.0),
            promedio_estacion: None,
            cumple_limite_infa: Some(0),
            cumple_limite_post: Some(0),
        })
        .expect("mot alto");

        let p = db
            .insert_perfil(&NewPerfil {
                ot_id: ot,
                codigo_perfil: "P1",
                profundidad_maxima_m: Some(40.0),
                utm_este: None,
                utm_norte: None,
            })
            .expect("perfil");
        db.insert_medicion_oxigeno(&NewMedicionOxigeno {
            perfil_id: p,
            numero_capa: 1,
            profundidad_m: Some(2.0),
            es_capa_z1: 0,
            oxigeno_mg_l: Some(13.5),
            temperatura_c: Some(9.0),
            salinidad_psu: Some(30.0),
            saturacion_pct: Some(140.0),
            cumple_limite: None,
        })
        .expect("oxigeno alto");

        let report = check(&db).expect("check");
        assert_eq!(report.anomalias.mot_sobre_advertencia, 1);
        assert_eq!(report.anomalias.oxigeno_sobre_advertencia, 1);
        assert!(report.is_clean(), "soft anomalies do not dirty the database");
    }

    #[test]
    fn test_inconsistent_station_average() {
        let (db, ot) = fixture();
        let est = db
            .insert_estacion(&NewEstacion {
                ot_id: ot,
                codigo_estacion: "E1",
                utm_este: None,
                utm_norte: None,
                profundidad_m: Some(30.0),
            })
            .expect("estacion");

        // Replicates average 5.0 but the stored average says 8.0
        for (replica, valor) in [(1, 4.0), (2, 6.0)] {
            db.insert_materia_organica(&NewMateriaOrganica {
                estacion_id: est,
                codigo_muestra: None,
                replica,
                peso_muestra_g: None,
                mot_porcentaje: Some(valor),
                promedio_estacion: Some(8.0),
                cumple_limite_infa: Some(1),
                cumple_limite_post: Some(1),
            })
            .expect("replica");
        }

        let report = check(&db).expect("check");
        assert_eq!(report.anomalias.promedios_inconsistentes, 1);
    }

    #[test]
    fn test_mismatched_replica_sets() {
        let (db, ot) = fixture();

        let mot = |db: &Database, est: i32, replica: i32| {
            db.insert_materia_organica(&NewMateriaOrganica {
                estacion_id: est,
                codigo_muestra: None,
                replica,
                peso_muestra_g: None,
                mot_porcentaje: Some(4.0),
                promedio_estacion: None,
                cumple_limite_infa: Some(1),
                cumple_limite_post: Some(1),
            })
            .expect("mot")
        };
        let ph = |db: &Database, est: i32, replica: i32| {
            db.insert_ph_redox(&crate::db::NewPhRedox {
                estacion_id: est,
                codigo_muestra: None,
                replica,
                ph: Some(7.4),
                promedio_ph: None,
                potencial_redox_mv: Some(110.0),
                promedio_redox: None,
                temperatura_c: Some(10.5),
                cumple_ph: Some(1),
                cumple_redox: Some(1),
                cumple_conjunto: Some(1),
            })
            .expect("ph redox")
        };

        // E1: both series cover replicas {1, 2}
        let e1 = db
            .insert_estacion(&NewEstacion {
                ot_id: ot,
                codigo_estacion: "E1",
                utm_este: None,
                utm_norte: None,
                profundidad_m: None,
            })
            .expect("estacion");
        for r in [1, 2] {
            mot(&db, e1, r);
            ph(&db, e1, r);
        }

        // E2: MOT has {1, 2}, pH/redox only {1}
        let e2 = db
            .insert_estacion(&NewEstacion {
                ot_id: ot,
                codigo_estacion: "E2",
                utm_este: None,
                utm_norte: None,
                profundidad_m: None,
            })
            .expect("estacion");
        mot(&db, e2, 1);
        mot(&db, e2, 2);
        ph(&db, e2, 1);

        // E3: MOT only, never paired, so it cannot mismatch
        let e3 = db
            .insert_estacion(&NewEstacion {
                ot_id: ot,
                codigo_estacion: "E3",
                utm_este: None,
                utm_norte: None,
                profundidad_m: None,
            })
            .expect("estacion");
        mot(&db, e3, 1);

        let report = check(&db).expect("check");
        assert_eq!(report.anomalias.replicas_desparejadas, 1);
    }

    #[test]
    fn test_error_hotspots_ranked() {
        let (db, _) = fixture();
        for _ in 0..3 {
            db.log_evento(NivelLog::Error, Some("malo.pdf"), Some("parse"), "tabla ilegible")
                .expect("log");
        }
        db.log_evento(NivelLog::Error, Some("regular.pdf"), Some("carga"), "fila invalida")
            .expect("log");
        db.log_evento(NivelLog::Warning, Some("malo.pdf"), Some("parse"), "celda vacia")
            .expect("log");

        let report = check(&db).expect("check");
        assert_eq!(report.focos_errores.len(), 2, "warnings are not hotspots");
        assert_eq!(report.focos_errores[0].archivo_origen.as_deref(), Some("malo.pdf"));
        assert_eq!(report.focos_errores[0].errores, 3);
        assert_eq!(report.focos_errores[1].errores, 1);
    }
}
