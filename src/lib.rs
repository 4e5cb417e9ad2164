//! Bentos - Relational store for aquaculture environmental monitoring
//!
//! Bentos holds the structured data extracted from Chilean aquaculture
//! environmental reports (INFA): sediment organic matter and pH/redox,
//! dissolved-oxygen profiles, and visual transect surveys, together with
//! the regulatory compliance rules that classify each measurement.
//!
//! # Overview
//!
//! Every sampling campaign arrives as one work order (orden de trabajo, OT)
//! attached to a centro (a monitored facility). Measurements hang off the OT
//! in three families: sediment stations with organic-matter and pH/redox
//! replicates, oxygen profiles with one reading per water-column layer, and
//! visual transects with species-abundance observations. CHECK constraints
//! reject physically impossible values at write time; SQL views classify
//! what got stored against the protocol limits, so the database answers
//! compliance questions directly.
//!
//! # Protocols
//!
//! The limit that applies to a measurement depends on the monitoring
//! protocol of its work order:
//!
//! | Protocol | MOT max | pH min | Redox min | O2 min (Z-1) |
//! |----------------------|---------|--------|-----------|--------------|
//! | INFA | 9.0% | 7.1 | 50 mV | 2.5 mg/L |
//! | INFA-POSTANAEROBICA | 8.0% | 7.1 | 75 mV | 3.0 mg/L |
//! | CPS | - | - | - | - |
//!
//! CPS centros have no numeric limits; their rows classify as NO APLICA.
//!
//! # Quick Start
//!
//! ```no_run
//! use bentos::{Database, NewCentro};
//!
//! let db = Database::open_at("monitoreo.db")?;
//!
//! let centro_id = db.insert_centro(&NewCentro {
//!     codigo_centro: "101234",
//!     nombre_centro: "Punta Quillaipe",
//!     categoria: Some(3),
//!     region: Some("Los Lagos"),
//!     utm_este: Some(662_150),
//!     utm_norte: Some(5_398_420),
//!     es_censurado: 0,
//! })?;
//!
//! for fila in db.cumplimiento_sedimento()? {
//!     println!("{} {}: {}", fila.codigo_ot, fila.codigo_estacion, fila.cumplimiento_mot);
//! }
//! # Ok::<(), bentos::DbError>(())
//! ```
//!
//! # Modules
//!
//! - [`db`]: Connection pool, schema DDL, typed insert/read API, reporting views
//! - [`limits`]: Regulatory constants and classification rules
//! - [`validate`]: Post-load integrity sweep (orphans, ranges, anomalies)
//! - [`report`]: Output formatters (JSON, CSV)

pub mod db;
pub mod limits;
pub mod report;
pub mod schema;
pub mod validate;

pub use db::{Database, DbError, DbSummary, NewCentro, NewOrdenTrabajo};
pub use limits::{Cumplimiento, TipoInforme, TipoMonitoreo};
pub use validate::IntegrityReport;
