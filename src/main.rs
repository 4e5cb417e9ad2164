use bentos::limits::NivelLog;
use bentos::report::{self, Resumen};
use bentos::{validate, Database};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bentos")]
#[command(author, version, about = "Environmental monitoring database for aquaculture centros (INFA)")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Database file (default: monitoreo_ambiental.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database file with schema, views and seed defaults
    Init,

    /// Show row counts per table
    Stats,

    /// Run integrity checks (orphans, ranges, missing data, anomalies)
    Check {
        /// Emit the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Also write the full report to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a compliance view (sedimento, oxigeno, visual, calidad)
    Report {
        /// View to export: sedimento, oxigeno, visual, calidad
        vista: String,

        /// Output file (.csv, .json); prints a summary to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show recent processing-log entries
    Log {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Filter by level: INFO, WARNING, ERROR, DEBUG
        #[arg(short, long)]
        nivel: Option<String>,
    },

    /// List or set ingestion default values
    Defaults {
        /// Key to set (lists all when omitted)
        clave: Option<String>,

        /// New value for the key
        valor: Option<String>,
    },
}

fn main() {
    let args = Args::parse();

    let db = match open_db(args.db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Init => {
            // open_db already created schema and seeds
            println!("Database ready.");
        }
        Command::Stats => handle_stats(&db),
        Command::Check { json, output } => handle_check(&db, json, output),
        Command::Report { vista, output } => handle_report(&db, &vista, output),
        Command::Log { limit, nivel } => handle_log(&db, limit, nivel),
        Command::Defaults { clave, valor } => handle_defaults(&db, clave, valor),
    }
}

fn open_db(path: Option<&std::path::Path>) -> bentos::db::Result<Database> {
    match path {
        Some(p) => Database::open_at(p),
        None => Database::open(),
    }
}

fn handle_stats(db: &Database) {
    match db.table_counts() {
        Ok(counts) => {
            println!("{:<30} {:>8}", "TABLE", "ROWS");
            println!("{}", "-".repeat(40));
            println!("{:<30} {:>8}", "centros", counts.centros);
            println!("{:<30} {:>8}", "ordenes_trabajo", counts.ordenes_trabajo);
            println!("{:<30} {:>8}", "sedimento_estaciones", counts.sedimento_estaciones);
            println!(
                "{:<30} {:>8}",
                "sedimento_materia_organica", counts.sedimento_materia_organica
            );
            println!("{:<30} {:>8}", "sedimento_ph_redox", counts.sedimento_ph_redox);
            println!("{:<30} {:>8}", "oxigeno_perfiles", counts.oxigeno_perfiles);
            println!("{:<30} {:>8}", "oxigeno_mediciones", counts.oxigeno_mediciones);
            println!(
                "{:<30} {:>8}",
                "registro_visual_transectas", counts.registro_visual_transectas
            );
            println!(
                "{:<30} {:>8}",
                "registro_visual_abundancia", counts.registro_visual_abundancia
            );
            println!("{:<30} {:>8}", "auditoria_extraccion", counts.auditoria_extraccion);
            println!("{:<30} {:>8}", "log_procesamiento", counts.log_procesamiento);
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_check(db: &Database, json: bool, output: Option<PathBuf>) {
    let report = match validate::check(db) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Integrity check failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = output {
        if let Err(e) = report::generate_integrity(&path, &report) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        println!("Report written to {}", path.display());
    }

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Error: {}", e),
        }
    } else {
        if report.is_clean() {
            println!("Database is clean.");
        } else {
            for h in &report.huerfanos {
                println!("ORPHANS   {:<30} {} rows", h.tabla, h.filas);
            }
            for r in &report.fuera_de_rango {
                println!("RANGE     {:<30} {}.{} ({} rows)", "", r.tabla, r.columna, r.filas);
            }
        }
        println!(
            "Missing:  {} MOT without value, {} Z-1 layers without oxygen, \
             {} OTs without date, {} OTs without centro",
            report.datos_faltantes.mot_sin_valor,
            report.datos_faltantes.z1_sin_oxigeno,
            report.datos_faltantes.ots_sin_fecha,
            report.datos_faltantes.ots_sin_centro,
        );
        println!(
            "Suspect:  {} MOT readings, {} oxygen readings, {} inconsistent station averages",
            report.anomalias.mot_sobre_advertencia,
            report.anomalias.oxigeno_sobre_advertencia,
            report.anomalias.promedios_inconsistentes,
        );
        if !report.focos_errores.is_empty() {
            println!("\nFiles with most ERROR log entries:");
            for foco in &report.focos_errores {
                println!(
                    "  {:<40} {}",
                    foco.archivo_origen.as_deref().unwrap_or("(sin archivo)"),
                    foco.errores
                );
            }
        }
    }

    if !report.is_clean() {
        std::process::exit(2);
    }
}

fn handle_report(db: &Database, vista: &str, output: Option<PathBuf>) {
    let result = match vista {
        "sedimento" => db.cumplimiento_sedimento().map(|rows| {
            let resumen =
                Resumen::from_clasificaciones(rows.iter().map(|r| r.cumplimiento_mot.as_str()));
            export_or_summary(&rows, resumen, output)
        }),
        "oxigeno" => db.cumplimiento_oxigeno().map(|rows| {
            let resumen = Resumen::from_clasificaciones(
                rows.iter().map(|r| r.cumplimiento_oxigeno.as_str()),
            );
            export_or_summary(&rows, resumen, output)
        }),
        "visual" => db.registro_visual().map(|rows| {
            if let Some(path) = output {
                write_report(&path, &rows);
            } else {
                println!("{} observations", rows.len());
                for r in &rows {
                    println!(
                        "{:<12} {:<8} {:<4} {}",
                        r.codigo_ot, r.codigo_transecta, r.codigo_abundancia,
                        r.abundancia_descripcion
                    );
                }
            }
        }),
        "calidad" => db.calidad_extraccion().map(|rows| {
            if let Some(path) = output {
                write_report(&path, &rows);
            } else {
                println!("{:<12} {:<28} {:>6} {}", "OT", "TABLE", "PCT", "GRADE");
                println!("{}", "-".repeat(60));
                for r in &rows {
                    println!(
                        "{:<12} {:<28} {:>6} {}",
                        r.codigo_ot,
                        r.tabla_afectada,
                        r.porcentaje_completitud
                            .map(|p| format!("{:.1}", p))
                            .unwrap_or_default(),
                        r.calidad
                    );
                }
            }
        }),
        other => {
            eprintln!("Unknown view '{}' (expected: sedimento, oxigeno, visual, calidad)", other);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn export_or_summary<T>(rows: &[T], resumen: Resumen, output: Option<PathBuf>)
where
    T: serde::Serialize + report::csv::CsvRecord,
{
    match output {
        Some(path) => write_report(&path, rows),
        None => {
            println!("{} rows", resumen.total);
            println!(
                "CUMPLE: {}  NO CUMPLE: {}  NO APLICA: {}",
                resumen.cumple, resumen.no_cumple, resumen.no_aplica
            );
            match resumen.tasa_cumplimiento() {
                Some(tasa) => println!("Compliance rate: {:.1}%", tasa),
                None => println!("Compliance rate: n/a (no applicable rows)"),
            }
        }
    }
}

fn write_report<T>(path: &std::path::Path, rows: &[T])
where
    T: serde::Serialize + report::csv::CsvRecord,
{
    match report::generate(path, rows) {
        Ok(()) => println!("Report written to {}", path.display()),
        Err(e) => {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
    }
}

fn handle_log(db: &Database, limit: i64, nivel: Option<String>) {
    let nivel = match nivel.as_deref() {
        None => None,
        Some(s) => match NivelLog::parse(s) {
            Some(n) => Some(n),
            None => {
                eprintln!("Unknown level '{}' (expected: INFO, WARNING, ERROR, DEBUG)", s);
                std::process::exit(1);
            }
        },
    };

    match db.recent_log(limit, nivel) {
        Ok(entries) => {
            if entries.is_empty() {
                println!("No log entries.");
                return;
            }
            for e in entries {
                println!(
                    "{} [{:<7}] {:<20} {}",
                    e.timestamp,
                    e.nivel,
                    e.archivo_origen.as_deref().unwrap_or("-"),
                    e.mensaje
                );
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_defaults(db: &Database, clave: Option<String>, valor: Option<String>) {
    match (clave, valor) {
        (None, _) => match db.defaults() {
            Ok(rows) => {
                println!("{:<20} {:<24} {}", "KEY", "VALUE", "DESCRIPTION");
                println!("{}", "-".repeat(70));
                for d in rows {
                    println!(
                        "{:<20} {:<24} {}",
                        d.clave,
                        d.valor,
                        d.descripcion.as_deref().unwrap_or("")
                    );
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        },
        (Some(clave), None) => match db.default_value(&clave) {
            Ok(Some(valor)) => println!("{}", valor),
            Ok(None) => {
                eprintln!("Key '{}' is not configured.", clave);
                std::process::exit(1);
            }
            Err(e) => eprintln!("Error: {}", e),
        },
        (Some(clave), Some(valor)) => match db.set_default_value(&clave, &valor, None) {
            Ok(()) => println!("{} = {}", clave, valor),
            Err(e) => eprintln!("Error: {}", e),
        },
    }
}
