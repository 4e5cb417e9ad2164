//! Report generation for compliance views
//!
//! Output formatters for the rows the reporting views produce:
//!
//! - **JSON**: machine-readable, for programmatic consumption
//! - **CSV**: spreadsheet-compatible, for regulators and analysts
//!
//! # Usage
//!
//! ```ignore
//! use bentos::report;
//!
//! let rows = db.cumplimiento_sedimento()?;
//! // Automatically picks format based on extension
//! report::generate("cumplimiento.json", &rows)?;  // JSON
//! report::generate("cumplimiento.csv", &rows)?;   // CSV
//! ```

pub mod csv;
pub mod json;

use std::io;
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P, T>(path: P, rows: &[T]) -> io::Result<()>
where
    P: AsRef<Path>,
    T: serde::Serialize + csv::CsvRecord,
{
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, rows),
        _ => csv::write(&mut file, rows),
    }
}

/// Write an integrity report as JSON. The report is a nested structure with
/// no sensible tabular rendering, so the extension is not consulted.
pub fn generate_integrity<P: AsRef<Path>>(
    path: P,
    report: &crate::validate::IntegrityReport,
) -> io::Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(&mut file, report).map_err(io::Error::from)?;
    writeln!(file)
}

/// Compliance tallies for a batch of classified rows
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Resumen {
    pub total: usize,
    pub cumple: usize,
    pub no_cumple: usize,
    pub no_aplica: usize,
}

impl Resumen {
    /// Tally classification strings ("CUMPLE" / "NO CUMPLE" / "NO APLICA")
    pub fn from_clasificaciones<'a, I>(clasificaciones: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resumen = Self::default();
        for c in clasificaciones {
            resumen.total += 1;
            match c {
                "CUMPLE" => resumen.cumple += 1,
                "NO CUMPLE" => resumen.no_cumple += 1,
                _ => resumen.no_aplica += 1,
            }
        }
        resumen
    }

    /// Fraction of applicable rows that comply, None when nothing applies
    pub fn tasa_cumplimiento(&self) -> Option<f64> {
        let aplicables = self.cumple + self.no_cumple;
        if aplicables == 0 {
            None
        } else {
            Some(self.cumple as f64 / aplicables as f64 * 100.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CumplimientoSedimento;

    // ==========================================================================
    // COMPLIANCE SUMMARY TESTS
    // ==========================================================================
    //
    // The Resumen struct tallies classification outcomes for a batch of view
    // rows. It heads every report so a reader sees the overall picture before
    // the row detail.
    // ==========================================================================

    fn row(cumplimiento: &str) -> CumplimientoSedimento {
        CumplimientoSedimento {
            codigo_centro: Some("C-1".to_string()),
            codigo_ot: "OT-1".to_string(),
            tipo_monitoreo: "INFA".to_string(),
            fecha_muestreo: Some("2024-03-15".to_string()),
            codigo_estacion: "E1".to_string(),
            replica: 1,
            mot_porcentaje: Some(5.0),
            promedio_estacion: None,
            cumplimiento_mot: cumplimiento.to_string(),
        }
    }

    fn resumen_de(rows: &[CumplimientoSedimento]) -> Resumen {
        Resumen::from_clasificaciones(rows.iter().map(|r| r.cumplimiento_mot.as_str()))
    }

    #[test]
    fn test_resumen_empty() {
        let resumen = resumen_de(&[]);
        assert_eq!(resumen.total, 0);
        assert_eq!(resumen.cumple, 0);
        assert_eq!(resumen.tasa_cumplimiento(), None);
    }

    #[test]
    fn test_resumen_mixed() {
        let rows = vec![
            row("CUMPLE"),
            row("CUMPLE"),
            row("CUMPLE"),
            row("NO CUMPLE"),
            row("NO APLICA"),
        ];
        let resumen = resumen_de(&rows);

        assert_eq!(resumen.total, 5);
        assert_eq!(resumen.cumple, 3);
        assert_eq!(resumen.no_cumple, 1);
        assert_eq!(resumen.no_aplica, 1);
        assert_eq!(resumen.tasa_cumplimiento(), Some(75.0));
    }

    #[test]
    fn test_resumen_all_no_aplica() {
        // CPS centros: nothing applies, rate is undefined rather than 0
        let rows = vec![row("NO APLICA"), row("NO APLICA")];
        let resumen = resumen_de(&rows);

        assert_eq!(resumen.total, 2);
        assert_eq!(resumen.no_aplica, 2);
        assert_eq!(resumen.tasa_cumplimiento(), None);
    }

    #[test]
    fn test_generate_picks_format_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rows = vec![row("CUMPLE")];

        let json_path = dir.path().join("salida.json");
        generate(&json_path, &rows).expect("json report");
        let contenido = std::fs::read_to_string(&json_path).expect("read");
        assert!(contenido.trim_start().starts_with('['));
        assert!(contenido.contains("\"cumplimiento_mot\""));

        let csv_path = dir.path().join("salida.csv");
        generate(&csv_path, &rows).expect("csv report");
        let contenido = std::fs::read_to_string(&csv_path).expect("read");
        assert!(contenido.starts_with("codigo_centro,"));
        assert!(contenido.lines().count() >= 2);
    }

    #[test]
    fn test_generate_integrity_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = crate::db::Database::open_in_memory().expect("in-memory database");
        let report = crate::validate::check(&db).expect("check");

        let path = dir.path().join("integridad.json");
        generate_integrity(&path, &report).expect("write");

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read"))
                .expect("output must parse back");
        assert!(parsed["huerfanos"].as_array().expect("array").is_empty());
        assert_eq!(parsed["datos_faltantes"]["mot_sin_valor"], 0);
    }
}
