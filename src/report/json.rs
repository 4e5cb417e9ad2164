//! JSON report output

use std::io::{self, Write};

/// Pretty-print rows as a JSON array, trailing newline included
pub fn write<W: Write, T: serde::Serialize>(w: &mut W, rows: &[T]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, rows).map_err(io::Error::from)?;
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CalidadExtraccionRow;

    #[test]
    fn test_write_is_valid_json() {
        let rows = vec![CalidadExtraccionRow {
            codigo_ot: "OT-1".to_string(),
            tabla_afectada: "sedimento_estaciones".to_string(),
            registros_esperados: 12,
            registros_extraidos: 11,
            porcentaje_completitud: Some(91.7),
            valores_fuera_rango: 0,
            requiere_revision: 0,
            calidad: "BUENO".to_string(),
        }];

        let mut buf = Vec::new();
        write(&mut buf, &rows).expect("write");

        let parsed: serde_json::Value =
            serde_json::from_slice(&buf).expect("output must parse back");
        assert_eq!(parsed[0]["codigo_ot"], "OT-1");
        assert_eq!(parsed[0]["calidad"], "BUENO");
    }

    #[test]
    fn test_empty_rows() {
        let rows: Vec<CalidadExtraccionRow> = vec![];
        let mut buf = Vec::new();
        write(&mut buf, &rows).expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8").trim(), "[]");
    }
}
