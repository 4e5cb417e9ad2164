//! CSV report output
//!
//! Hand-rolled writer: the rows are flat and the column sets are fixed, so a
//! header line plus RFC 4180 field escaping covers everything the consumers
//! (spreadsheets, regulator upload portals) need.

use crate::db::{CalidadExtraccionRow, CumplimientoOxigeno, CumplimientoSedimento, RegistroVisual};
use std::io::{self, Write};

/// A row type that knows its CSV column layout
pub trait CsvRecord {
    /// Comma-separated header line
    const HEADER: &'static str;

    /// Field values in header order, unescaped
    fn fields(&self) -> Vec<String>;
}

/// Write a header line followed by one escaped record per row
pub fn write<W: Write, T: CsvRecord>(w: &mut W, rows: &[T]) -> io::Result<()> {
    writeln!(w, "{}", T::HEADER)?;
    for row in rows {
        let record: Vec<String> = row.fields().iter().map(|f| escape(f)).collect();
        writeln!(w, "{}", record.join(","))?;
    }
    Ok(())
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl CsvRecord for CumplimientoSedimento {
    const HEADER: &'static str = "codigo_centro,codigo_ot,tipo_monitoreo,fecha_muestreo,\
codigo_estacion,replica,mot_porcentaje,promedio_estacion,cumplimiento_mot";

    fn fields(&self) -> Vec<String> {
        vec![
            opt(&self.codigo_centro),
            self.codigo_ot.clone(),
            self.tipo_monitoreo.clone(),
            opt(&self.fecha_muestreo),
            self.codigo_estacion.clone(),
            self.replica.to_string(),
            opt(&self.mot_porcentaje),
            opt(&self.promedio_estacion),
            self.cumplimiento_mot.clone(),
        ]
    }
}

impl CsvRecord for CumplimientoOxigeno {
    const HEADER: &'static str = "codigo_centro,codigo_ot,tipo_monitoreo,codigo_perfil,\
profundidad_m,oxigeno_mg_l,temperatura_c,salinidad_psu,saturacion_pct,\
cumplimiento_oxigeno,banda_oxigeno";

    fn fields(&self) -> Vec<String> {
        vec![
            opt(&self.codigo_centro),
            self.codigo_ot.clone(),
            self.tipo_monitoreo.clone(),
            self.codigo_perfil.clone(),
            opt(&self.profundidad_m),
            opt(&self.oxigeno_mg_l),
            opt(&self.temperatura_c),
            opt(&self.salinidad_psu),
            opt(&self.saturacion_pct),
            self.cumplimiento_oxigeno.clone(),
            opt(&self.banda_oxigeno),
        ]
    }
}

impl CsvRecord for RegistroVisual {
    const HEADER: &'static str = "codigo_centro,codigo_ot,codigo_transecta,sustrato,\
presencia_matas,presencia_burbujas,grupo_taxonomico,especie,codigo_abundancia,\
abundancia_descripcion,conteo_min,conteo_max";

    fn fields(&self) -> Vec<String> {
        vec![
            opt(&self.codigo_centro),
            self.codigo_ot.clone(),
            self.codigo_transecta.clone(),
            opt(&self.sustrato),
            opt(&self.presencia_matas),
            opt(&self.presencia_burbujas),
            opt(&self.grupo_taxonomico),
            opt(&self.especie),
            self.codigo_abundancia.clone(),
            self.abundancia_descripcion.clone(),
            opt(&self.conteo_min),
            opt(&self.conteo_max),
        ]
    }
}

impl CsvRecord for CalidadExtraccionRow {
    const HEADER: &'static str = "codigo_ot,tabla_afectada,registros_esperados,\
registros_extraidos,porcentaje_completitud,valores_fuera_rango,requiere_revision,calidad";

    fn fields(&self) -> Vec<String> {
        vec![
            self.codigo_ot.clone(),
            self.tabla_afectada.clone(),
            self.registros_esperados.to_string(),
            self.registros_extraidos.to_string(),
            opt(&self.porcentaje_completitud),
            self.valores_fuera_rango.to_string(),
            self.requiere_revision.to_string(),
            self.calidad.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_field_untouched() {
        assert_eq!(escape("OT-1001"), "OT-1001");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_escape_comma_and_quote() {
        assert_eq!(escape("matas, dispersas"), "\"matas, dispersas\"");
        assert_eq!(escape("dicho \"limpio\""), "\"dicho \"\"limpio\"\"\"");
    }

    #[test]
    fn test_write_header_and_rows() {
        let rows = vec![RegistroVisual {
            codigo_centro: None,
            codigo_ot: "OT-1".to_string(),
            codigo_transecta: "T1".to_string(),
            sustrato: Some("Blando".to_string()),
            presencia_matas: Some(1),
            presencia_burbujas: Some(0),
            grupo_taxonomico: Some("Mollusca".to_string()),
            especie: None,
            codigo_abundancia: "MA".to_string(),
            abundancia_descripcion: "Muy Abundante (>20)".to_string(),
            conteo_min: Some(21),
            conteo_max: None,
        }];

        let mut buf = Vec::new();
        write(&mut buf, &rows).expect("write");
        let out = String::from_utf8(buf).expect("utf8");
        let mut lines = out.lines();

        assert_eq!(lines.next(), Some(RegistroVisual::HEADER));
        let record = lines.next().expect("one record");
        assert!(record.starts_with(",OT-1,T1,Blando,1,0,Mollusca,,MA,"));
        assert!(record.contains("\"Muy Abundante (>20)\"") || record.contains("Muy Abundante (>20)"));
        assert_eq!(lines.next(), None);
    }
}
