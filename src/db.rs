//! SQLite database with Diesel ORM
//!
//! Owns the monitoring schema end to end: table DDL with the CHECK
//! constraints that are the single source of truth for write validity,
//! the compliance/classification views consumed by BI dashboards, and the
//! typed insert/read API used by ingestion processes.
//!
//! Foreign keys are enforced on every pooled connection (SQLite leaves them
//! off by default), so deleting a centro cascades through its work orders
//! down to individual measurements. The processing log and the defaults
//! table are deliberately outside the cascade graph.

use crate::limits::{
    self, CodigoAbundancia, NivelLog, COMPLETITUD_BUENO, COMPLETITUD_EXCELENTE,
    COMPLETITUD_REGULAR, MOT_MAX_INFA, MOT_MAX_POST, OXIGENO_BANDA_BAJO, OXIGENO_BANDA_CRITICO,
    OXIGENO_BANDA_MODERADO, OXIGENO_MIN_INFA, OXIGENO_MIN_POST, UTM_ESTE_MAX, UTM_ESTE_MIN,
    UTM_NORTE_MAX, UTM_NORTE_MIN,
};
use crate::schema::*;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sql_types::{BigInt, Double, Integer, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use log::{debug, info};
use std::path::Path;
use thiserror::Error;

const DEFAULT_DB_PATH: &str = "monitoreo_ambiental.db";

/// Fallback values handed to ingestion when a source document is censored
/// or a field cannot be extracted. Seeded into `configuracion_defaults`.
const SEED_DEFAULTS: &[(&str, &str, &str)] = &[
    ("CENTRO_PREFIX", "CENS_", "Prefijo para centros censurados"),
    ("CENTRO_CODIGO", "CENTRO_UNKNOWN", "Codigo de centro no identificado"),
    ("CENTRO_NOMBRE", "CENTRO_SIN_NOMBRE", "Nombre de centro no identificado"),
    ("REGION", "SIN_ESPECIFICAR", "Region por defecto"),
    ("TIPO_MONITOREO", "INFA", "Protocolo asumido cuando no se detecta"),
];

// ============================================================================
// Diesel Models
// ============================================================================

/// Insertable centro (monitored facility)
#[derive(Insertable)]
#[diesel(table_name = centros)]
pub struct NewCentro<'a> {
    pub codigo_centro: &'a str,
    pub nombre_centro: &'a str,
    pub categoria: Option<i32>,
    pub region: Option<&'a str>,
    pub utm_este: Option<i32>,
    pub utm_norte: Option<i32>,
    pub es_censurado: i32,
}

/// Queryable centro
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = centros)]
pub struct Centro {
    pub centro_id: i32,
    pub codigo_centro: String,
    pub nombre_centro: String,
    pub categoria: Option<i32>,
    pub region: Option<String>,
    pub utm_este: Option<i32>,
    pub utm_norte: Option<i32>,
    pub es_censurado: i32,
    pub fecha_registro: String,
}

/// Insertable orden de trabajo (one sampling/report event)
#[derive(Insertable)]
#[diesel(table_name = ordenes_trabajo)]
pub struct NewOrdenTrabajo<'a> {
    pub codigo_ot: &'a str,
    pub centro_id: Option<i32>,
    pub tipo_informe: &'a str,
    pub tipo_monitoreo: &'a str,
    pub fecha_muestreo: Option<&'a str>,
    pub condicion_centro: &'a str,
    pub numero_incumplimientos: i32,
    pub requiere_revision: i32,
    pub archivo_pdf_original: Option<&'a str>,
}

/// Queryable orden de trabajo
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = ordenes_trabajo)]
pub struct OrdenTrabajo {
    pub ot_id: i32,
    pub codigo_ot: String,
    pub centro_id: Option<i32>,
    pub tipo_informe: String,
    pub tipo_monitoreo: String,
    pub fecha_muestreo: Option<String>,
    pub condicion_centro: String,
    pub numero_incumplimientos: i32,
    pub requiere_revision: i32,
    pub archivo_pdf_original: Option<String>,
    pub fecha_procesamiento: String,
}

/// Insertable sediment station
#[derive(Insertable)]
#[diesel(table_name = sedimento_estaciones)]
pub struct NewEstacion<'a> {
    pub ot_id: i32,
    pub codigo_estacion: &'a str,
    pub utm_este: Option<i32>,
    pub utm_norte: Option<i32>,
    pub profundidad_m: Option<f64>,
}

/// Queryable sediment station
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = sedimento_estaciones)]
pub struct Estacion {
    pub estacion_id: i32,
    pub ot_id: i32,
    pub codigo_estacion: String,
    pub utm_este: Option<i32>,
    pub utm_norte: Option<i32>,
    pub profundidad_m: Option<f64>,
}

/// Insertable organic-matter replicate
#[derive(Insertable)]
#[diesel(table_name = sedimento_materia_organica)]
pub struct NewMateriaOrganica<'a> {
    pub estacion_id: i32,
    pub codigo_muestra: Option<&'a str>,
    pub replica: i32,
    pub peso_muestra_g: Option<f64>,
    pub mot_porcentaje: Option<f64>,
    pub promedio_estacion: Option<f64>,
    pub cumple_limite_infa: Option<i32>,
    pub cumple_limite_post: Option<i32>,
}

/// Queryable organic-matter replicate
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = sedimento_materia_organica)]
pub struct MateriaOrganica {
    pub muestra_id: i32,
    pub estacion_id: i32,
    pub codigo_muestra: Option<String>,
    pub replica: i32,
    pub peso_muestra_g: Option<f64>,
    pub mot_porcentaje: Option<f64>,
    pub promedio_estacion: Option<f64>,
    pub cumple_limite_infa: Option<i32>,
    pub cumple_limite_post: Option<i32>,
}

/// Insertable pH/redox replicate
#[derive(Insertable)]
#[diesel(table_name = sedimento_ph_redox)]
pub struct NewPhRedox<'a> {
    pub estacion_id: i32,
    pub codigo_muestra: Option<&'a str>,
    pub replica: i32,
    pub ph: Option<f64>,
    pub promedio_ph: Option<f64>,
    pub potencial_redox_mv: Option<f64>,
    pub promedio_redox: Option<f64>,
    pub temperatura_c: Option<f64>,
    pub cumple_ph: Option<i32>,
    pub cumple_redox: Option<i32>,
    pub cumple_conjunto: Option<i32>,
}

/// Queryable pH/redox replicate
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = sedimento_ph_redox)]
pub struct PhRedox {
    pub muestra_id: i32,
    pub estacion_id: i32,
    pub codigo_muestra: Option<String>,
    pub replica: i32,
    pub ph: Option<f64>,
    pub promedio_ph: Option<f64>,
    pub potencial_redox_mv: Option<f64>,
    pub promedio_redox: Option<f64>,
    pub temperatura_c: Option<f64>,
    pub cumple_ph: Option<i32>,
    pub cumple_redox: Option<i32>,
    pub cumple_conjunto: Option<i32>,
}

/// Insertable oxygen profile
#[derive(Insertable)]
#[diesel(table_name = oxigeno_perfiles)]
pub struct NewPerfil<'a> {
    pub ot_id: i32,
    pub codigo_perfil: &'a str,
    pub profundidad_maxima_m: Option<f64>,
    pub utm_este: Option<i32>,
    pub utm_norte: Option<i32>,
}

/// Queryable oxygen profile
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = oxigeno_perfiles)]
pub struct Perfil {
    pub perfil_id: i32,
    pub ot_id: i32,
    pub codigo_perfil: String,
    pub profundidad_maxima_m: Option<f64>,
    pub utm_este: Option<i32>,
    pub utm_norte: Option<i32>,
}

/// Insertable oxygen measurement (one water-column layer)
#[derive(Insertable)]
#[diesel(table_name = oxigeno_mediciones)]
pub struct NewMedicionOxigeno {
    pub perfil_id: i32,
    pub numero_capa: i32,
    pub profundidad_m: Option<f64>,
    pub es_capa_z1: i32,
    pub oxigeno_mg_l: Option<f64>,
    pub temperatura_c: Option<f64>,
    pub salinidad_psu: Option<f64>,
    pub saturacion_pct: Option<f64>,
    pub cumple_limite: Option<i32>,
}

/// Queryable oxygen measurement
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = oxigeno_mediciones)]
pub struct MedicionOxigeno {
    pub medicion_id: i32,
    pub perfil_id: i32,
    pub numero_capa: i32,
    pub profundidad_m: Option<f64>,
    pub es_capa_z1: i32,
    pub oxigeno_mg_l: Option<f64>,
    pub temperatura_c: Option<f64>,
    pub salinidad_psu: Option<f64>,
    pub saturacion_pct: Option<f64>,
    pub cumple_limite: Option<i32>,
}

/// Insertable visual transect
#[derive(Insertable)]
#[diesel(table_name = registro_visual_transectas)]
pub struct NewTransecta<'a> {
    pub ot_id: i32,
    pub codigo_transecta: &'a str,
    pub fecha_filmacion: Option<&'a str>,
    pub hora_inicio: Option<&'a str>,
    pub hora_fin: Option<&'a str>,
    pub sustrato: Option<&'a str>,
    pub presencia_matas: Option<i32>,
    pub presencia_burbujas: Option<i32>,
    pub observaciones: Option<&'a str>,
}

/// Queryable visual transect
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = registro_visual_transectas)]
pub struct Transecta {
    pub transecta_id: i32,
    pub ot_id: i32,
    pub codigo_transecta: String,
    pub fecha_filmacion: Option<String>,
    pub hora_inicio: Option<String>,
    pub hora_fin: Option<String>,
    pub sustrato: Option<String>,
    pub presencia_matas: Option<i32>,
    pub presencia_burbujas: Option<i32>,
    pub observaciones: Option<String>,
}

/// Insertable abundance observation
#[derive(Insertable)]
#[diesel(table_name = registro_visual_abundancia)]
pub struct NewAbundancia<'a> {
    pub transecta_id: i32,
    pub grupo_taxonomico: Option<&'a str>,
    pub especie: Option<&'a str>,
    pub codigo_abundancia: &'a str,
    pub conteo_min: Option<i32>,
    pub conteo_max: Option<i32>,
}

/// Queryable abundance observation
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = registro_visual_abundancia)]
pub struct Abundancia {
    pub observacion_id: i32,
    pub transecta_id: i32,
    pub grupo_taxonomico: Option<String>,
    pub especie: Option<String>,
    pub codigo_abundancia: String,
    pub conteo_min: Option<i32>,
    pub conteo_max: Option<i32>,
}

/// Insertable extraction-audit row (one per affected table per run)
#[derive(Insertable)]
#[diesel(table_name = auditoria_extraccion)]
pub struct NewAuditoria<'a> {
    pub ot_id: i32,
    pub tabla_afectada: &'a str,
    pub registros_esperados: i32,
    pub registros_extraidos: i32,
    pub porcentaje_completitud: Option<f64>,
    pub valores_fuera_rango: i32,
    pub duracion_segundos: Option<f64>,
    pub requiere_revision: i32,
}

/// Queryable extraction-audit row
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = auditoria_extraccion)]
pub struct Auditoria {
    pub auditoria_id: i32,
    pub ot_id: i32,
    pub tabla_afectada: String,
    pub registros_esperados: i32,
    pub registros_extraidos: i32,
    pub porcentaje_completitud: Option<f64>,
    pub valores_fuera_rango: i32,
    pub duracion_segundos: Option<f64>,
    pub requiere_revision: i32,
    pub fecha_proceso: String,
}

/// Insertable processing-log entry (append-only, survives cascades)
#[derive(Insertable)]
#[diesel(table_name = log_procesamiento)]
pub struct NewLogEntry<'a> {
    pub timestamp: String,
    pub nivel: &'a str,
    pub archivo_origen: Option<&'a str>,
    pub fase: Option<&'a str>,
    pub mensaje: &'a str,
}

/// Queryable processing-log entry
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = log_procesamiento)]
pub struct LogEntry {
    pub log_id: i32,
    pub timestamp: String,
    pub nivel: String,
    pub archivo_origen: Option<String>,
    pub fase: Option<String>,
    pub mensaje: String,
}

/// Queryable default-value row
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = configuracion_defaults)]
pub struct DefaultValue {
    pub clave: String,
    pub valor: String,
    pub descripcion: Option<String>,
}

// ============================================================================
// View Rows
// ============================================================================

/// Row of `vista_cumplimiento_sedimento`
#[derive(QueryableByName, Debug, Clone, serde::Serialize)]
pub struct CumplimientoSedimento {
    #[diesel(sql_type = Nullable<Text>)]
    pub codigo_centro: Option<String>,
    #[diesel(sql_type = Text)]
    pub codigo_ot: String,
    #[diesel(sql_type = Text)]
    pub tipo_monitoreo: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub fecha_muestreo: Option<String>,
    #[diesel(sql_type = Text)]
    pub codigo_estacion: String,
    #[diesel(sql_type = Integer)]
    pub replica: i32,
    #[diesel(sql_type = Nullable<Double>)]
    pub mot_porcentaje: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub promedio_estacion: Option<f64>,
    #[diesel(sql_type = Text)]
    pub cumplimiento_mot: String,
}

/// Row of `vista_cumplimiento_oxigeno` (Z-1 layers only)
#[derive(QueryableByName, Debug, Clone, serde::Serialize)]
pub struct CumplimientoOxigeno {
    #[diesel(sql_type = Nullable<Text>)]
    pub codigo_centro: Option<String>,
    #[diesel(sql_type = Text)]
    pub codigo_ot: String,
    #[diesel(sql_type = Text)]
    pub tipo_monitoreo: String,
    #[diesel(sql_type = Text)]
    pub codigo_perfil: String,
    #[diesel(sql_type = Nullable<Double>)]
    pub profundidad_m: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub oxigeno_mg_l: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub temperatura_c: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub salinidad_psu: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub saturacion_pct: Option<f64>,
    #[diesel(sql_type = Text)]
    pub cumplimiento_oxigeno: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub banda_oxigeno: Option<String>,
}

/// Row of `vista_registro_visual`
#[derive(QueryableByName, Debug, Clone, serde::Serialize)]
pub struct RegistroVisual {
    #[diesel(sql_type = Nullable<Text>)]
    pub codigo_centro: Option<String>,
    #[diesel(sql_type = Text)]
    pub codigo_ot: String,
    #[diesel(sql_type = Text)]
    pub codigo_transecta: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub sustrato: Option<String>,
    #[diesel(sql_type = Nullable<Integer>)]
    pub presencia_matas: Option<i32>,
    #[diesel(sql_type = Nullable<Integer>)]
    pub presencia_burbujas: Option<i32>,
    #[diesel(sql_type = Nullable<Text>)]
    pub grupo_taxonomico: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub especie: Option<String>,
    #[diesel(sql_type = Text)]
    pub codigo_abundancia: String,
    #[diesel(sql_type = Text)]
    pub abundancia_descripcion: String,
    #[diesel(sql_type = Nullable<Integer>)]
    pub conteo_min: Option<i32>,
    #[diesel(sql_type = Nullable<Integer>)]
    pub conteo_max: Option<i32>,
}

/// Row of `vista_calidad_extraccion`
#[derive(QueryableByName, Debug, Clone, serde::Serialize)]
pub struct CalidadExtraccionRow {
    #[diesel(sql_type = Text)]
    pub codigo_ot: String,
    #[diesel(sql_type = Text)]
    pub tabla_afectada: String,
    #[diesel(sql_type = Integer)]
    pub registros_esperados: i32,
    #[diesel(sql_type = Integer)]
    pub registros_extraidos: i32,
    #[diesel(sql_type = Nullable<Double>)]
    pub porcentaje_completitud: Option<f64>,
    #[diesel(sql_type = Integer)]
    pub valores_fuera_rango: i32,
    #[diesel(sql_type = Integer)]
    pub requiere_revision: i32,
    #[diesel(sql_type = Text)]
    pub calidad: String,
}

// ============================================================================
// Database Connection
// ============================================================================

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
}

/// Error type for database operations
#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// SQLite ships with foreign-key enforcement off; without this the ON DELETE
/// CASCADE clauses in the DDL are dead letters.
#[derive(Debug, Clone, Copy)]
struct ForeignKeyEnforcer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ForeignKeyEnforcer {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        diesel::sql_query("PRAGMA foreign_keys = ON")
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Helper for COUNT(*) raw queries
#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

impl Database {
    /// Get the default database path
    pub fn db_path() -> std::path::PathBuf {
        std::path::PathBuf::from(DEFAULT_DB_PATH)
    }

    /// Open database at default path
    pub fn open() -> Result<Self> {
        Self::open_at(DEFAULT_DB_PATH)
    }

    /// Open database at specified path, creating the schema if needed
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Self::build(&path_str, 5)?;
        db.init_schema()?;
        info!("base de datos abierta: {}", path_str);
        Ok(db)
    }

    /// Open an in-memory database. Pool size is 1 because every SQLite
    /// `:memory:` connection is its own private database.
    pub fn open_in_memory() -> Result<Self> {
        let db = Self::build(":memory:", 1)?;
        db.init_schema()?;
        Ok(db)
    }

    fn build(path: &str, max_size: u32) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(path);
        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(ForeignKeyEnforcer))
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub(crate) fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| DbError::Connection(e.to_string()))
    }

    /// Create tables, indexes and views. Idempotent: every statement is
    /// IF NOT EXISTS / OR IGNORE, so reopening an existing file is safe.
    pub fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;
        debug!("inicializando schema");

        diesel::sql_query(format!(
            r#"
            CREATE TABLE IF NOT EXISTS centros (
                centro_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                codigo_centro TEXT NOT NULL UNIQUE,
                nombre_centro TEXT NOT NULL,
                categoria INTEGER CHECK (categoria BETWEEN 1 AND 5),
                region TEXT,
                utm_este INTEGER CHECK (utm_este BETWEEN {este_min} AND {este_max}),
                utm_norte INTEGER CHECK (utm_norte BETWEEN {norte_min} AND {norte_max}),
                es_censurado INTEGER NOT NULL DEFAULT 0 CHECK (es_censurado IN (0, 1)),
                fecha_registro TEXT NOT NULL DEFAULT (datetime('now')),
                CHECK ((utm_este IS NULL AND utm_norte IS NULL)
                    OR (utm_este IS NOT NULL AND utm_norte IS NOT NULL AND utm_norte > utm_este))
            )
        "#,
            este_min = UTM_ESTE_MIN,
            este_max = UTM_ESTE_MAX,
            norte_min = UTM_NORTE_MIN,
            norte_max = UTM_NORTE_MAX,
        ))
        .execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS ordenes_trabajo (
                ot_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                codigo_ot TEXT NOT NULL UNIQUE,
                centro_id INTEGER REFERENCES centros(centro_id) ON DELETE CASCADE,
                tipo_informe TEXT NOT NULL
                    CHECK (tipo_informe IN ('SEDIMENTO', 'OXIGENO', 'VISUAL', 'MIXTO')),
                tipo_monitoreo TEXT NOT NULL DEFAULT 'INFA'
                    CHECK (tipo_monitoreo IN ('INFA', 'INFA-POSTANAEROBICA', 'CPS')),
                fecha_muestreo TEXT,
                condicion_centro TEXT NOT NULL DEFAULT 'AEROBICO'
                    CHECK (condicion_centro IN ('AEROBICO', 'ANAEROBICO')),
                numero_incumplimientos INTEGER NOT NULL DEFAULT 0
                    CHECK (numero_incumplimientos >= 0),
                requiere_revision INTEGER NOT NULL DEFAULT 0
                    CHECK (requiere_revision IN (0, 1)),
                archivo_pdf_original TEXT,
                fecha_procesamiento TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(format!(
            r#"
            CREATE TABLE IF NOT EXISTS sedimento_estaciones (
                estacion_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                ot_id INTEGER NOT NULL REFERENCES ordenes_trabajo(ot_id) ON DELETE CASCADE,
                codigo_estacion TEXT NOT NULL,
                utm_este INTEGER CHECK (utm_este BETWEEN {este_min} AND {este_max}),
                utm_norte INTEGER CHECK (utm_norte BETWEEN {norte_min} AND {norte_max}),
                profundidad_m REAL CHECK (profundidad_m > 0 AND profundidad_m < 300),
                UNIQUE (ot_id, codigo_estacion)
            )
        "#,
            este_min = UTM_ESTE_MIN,
            este_max = UTM_ESTE_MAX,
            norte_min = UTM_NORTE_MIN,
            norte_max = UTM_NORTE_MAX,
        ))
        .execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS sedimento_materia_organica (
                muestra_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                estacion_id INTEGER NOT NULL
                    REFERENCES sedimento_estaciones(estacion_id) ON DELETE CASCADE,
                codigo_muestra TEXT,
                replica INTEGER NOT NULL CHECK (replica BETWEEN 1 AND 10),
                peso_muestra_g REAL CHECK (peso_muestra_g > 0),
                mot_porcentaje REAL CHECK (mot_porcentaje BETWEEN 0 AND 100),
                promedio_estacion REAL CHECK (promedio_estacion BETWEEN 0 AND 100),
                cumple_limite_infa INTEGER CHECK (cumple_limite_infa IN (0, 1)),
                cumple_limite_post INTEGER CHECK (cumple_limite_post IN (0, 1))
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS sedimento_ph_redox (
                muestra_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                estacion_id INTEGER NOT NULL
                    REFERENCES sedimento_estaciones(estacion_id) ON DELETE CASCADE,
                codigo_muestra TEXT,
                replica INTEGER NOT NULL CHECK (replica BETWEEN 1 AND 10),
                ph REAL CHECK (ph BETWEEN 0 AND 14),
                promedio_ph REAL CHECK (promedio_ph BETWEEN 0 AND 14),
                potencial_redox_mv REAL CHECK (potencial_redox_mv BETWEEN -500 AND 500),
                promedio_redox REAL CHECK (promedio_redox BETWEEN -500 AND 500),
                temperatura_c REAL CHECK (temperatura_c BETWEEN 5 AND 20),
                cumple_ph INTEGER CHECK (cumple_ph IN (0, 1)),
                cumple_redox INTEGER CHECK (cumple_redox IN (0, 1)),
                cumple_conjunto INTEGER CHECK (cumple_conjunto IN (0, 1))
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(format!(
            r#"
            CREATE TABLE IF NOT EXISTS oxigeno_perfiles (
                perfil_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                ot_id INTEGER NOT NULL REFERENCES ordenes_trabajo(ot_id) ON DELETE CASCADE,
                codigo_perfil TEXT NOT NULL,
                profundidad_maxima_m REAL
                    CHECK (profundidad_maxima_m > 0 AND profundidad_maxima_m < 300),
                utm_este INTEGER CHECK (utm_este BETWEEN {este_min} AND {este_max}),
                utm_norte INTEGER CHECK (utm_norte BETWEEN {norte_min} AND {norte_max}),
                UNIQUE (ot_id, codigo_perfil)
            )
        "#,
            este_min = UTM_ESTE_MIN,
            este_max = UTM_ESTE_MAX,
            norte_min = UTM_NORTE_MIN,
            norte_max = UTM_NORTE_MAX,
        ))
        .execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS oxigeno_mediciones (
                medicion_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                perfil_id INTEGER NOT NULL
                    REFERENCES oxigeno_perfiles(perfil_id) ON DELETE CASCADE,
                numero_capa INTEGER NOT NULL CHECK (numero_capa >= 1),
                profundidad_m REAL CHECK (profundidad_m >= 0),
                es_capa_z1 INTEGER NOT NULL DEFAULT 0 CHECK (es_capa_z1 IN (0, 1)),
                oxigeno_mg_l REAL CHECK (oxigeno_mg_l BETWEEN 0 AND 15),
                temperatura_c REAL CHECK (temperatura_c BETWEEN 5 AND 20),
                salinidad_psu REAL CHECK (salinidad_psu BETWEEN 0 AND 40),
                saturacion_pct REAL CHECK (saturacion_pct BETWEEN 0 AND 200),
                cumple_limite INTEGER CHECK (cumple_limite IN (0, 1))
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS registro_visual_transectas (
                transecta_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                ot_id INTEGER NOT NULL REFERENCES ordenes_trabajo(ot_id) ON DELETE CASCADE,
                codigo_transecta TEXT NOT NULL,
                fecha_filmacion TEXT,
                hora_inicio TEXT,
                hora_fin TEXT,
                sustrato TEXT CHECK (sustrato IN ('Duro', 'Blando', 'Mixto')),
                presencia_matas INTEGER CHECK (presencia_matas IN (0, 1)),
                presencia_burbujas INTEGER CHECK (presencia_burbujas IN (0, 1)),
                observaciones TEXT,
                UNIQUE (ot_id, codigo_transecta)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS registro_visual_abundancia (
                observacion_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                transecta_id INTEGER NOT NULL
                    REFERENCES registro_visual_transectas(transecta_id) ON DELETE CASCADE,
                grupo_taxonomico TEXT,
                especie TEXT,
                codigo_abundancia TEXT NOT NULL
                    CHECK (codigo_abundancia IN ('R', 'E', 'M', 'A', 'MA', '-')),
                conteo_min INTEGER CHECK (conteo_min >= 0),
                conteo_max INTEGER CHECK (conteo_max >= 0),
                CHECK (conteo_min IS NULL OR conteo_max IS NULL OR conteo_max >= conteo_min)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS auditoria_extraccion (
                auditoria_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                ot_id INTEGER NOT NULL REFERENCES ordenes_trabajo(ot_id) ON DELETE CASCADE,
                tabla_afectada TEXT NOT NULL,
                registros_esperados INTEGER NOT NULL DEFAULT 0
                    CHECK (registros_esperados >= 0),
                registros_extraidos INTEGER NOT NULL DEFAULT 0
                    CHECK (registros_extraidos >= 0),
                porcentaje_completitud REAL CHECK (porcentaje_completitud >= 0),
                valores_fuera_rango INTEGER NOT NULL DEFAULT 0
                    CHECK (valores_fuera_rango >= 0),
                duracion_segundos REAL CHECK (duracion_segundos >= 0),
                requiere_revision INTEGER NOT NULL DEFAULT 0
                    CHECK (requiere_revision IN (0, 1)),
                fecha_proceso TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#).execute(&mut conn)?;

        // No foreign keys on purpose: log entries must survive centro and
        // OT deletions.
        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS log_procesamiento (
                log_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                timestamp TEXT NOT NULL DEFAULT (datetime('now')),
                nivel TEXT NOT NULL
                    CHECK (nivel IN ('INFO', 'WARNING', 'ERROR', 'DEBUG')),
                archivo_origen TEXT,
                fase TEXT,
                mensaje TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS configuracion_defaults (
                clave TEXT PRIMARY KEY NOT NULL,
                valor TEXT NOT NULL,
                descripcion TEXT
            )
        "#).execute(&mut conn)?;

        // Indexes on FK columns and the columns the views filter on
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_ot_centro ON ordenes_trabajo(centro_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_ot_tipo ON ordenes_trabajo(tipo_informe)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_estaciones_ot ON sedimento_estaciones(ot_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_mot_estacion ON sedimento_materia_organica(estacion_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_ph_redox_estacion ON sedimento_ph_redox(estacion_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_perfiles_ot ON oxigeno_perfiles(ot_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_mediciones_perfil ON oxigeno_mediciones(perfil_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_mediciones_z1 ON oxigeno_mediciones(es_capa_z1)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_transectas_ot ON registro_visual_transectas(ot_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_abundancia_transecta ON registro_visual_abundancia(transecta_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_auditoria_ot ON auditoria_extraccion(ot_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_log_nivel ON log_procesamiento(nivel)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_log_archivo ON log_procesamiento(archivo_origen)").execute(&mut conn)?;

        self.create_views(&mut conn)?;
        self.seed_defaults(&mut conn)?;
        Ok(())
    }

    /// Reporting views. Thresholds are interpolated from `limits` so the SQL
    /// and the Rust classification rules cannot drift apart.
    fn create_views(&self, conn: &mut SqliteConnection) -> Result<()> {
        diesel::sql_query(format!(
            r#"
            CREATE VIEW IF NOT EXISTS vista_cumplimiento_sedimento AS
            SELECT
                c.codigo_centro,
                ot.codigo_ot,
                ot.tipo_monitoreo,
                ot.fecha_muestreo,
                e.codigo_estacion,
                m.replica,
                m.mot_porcentaje,
                m.promedio_estacion,
                CASE
                    WHEN m.mot_porcentaje IS NULL THEN 'NO APLICA'
                    WHEN ot.tipo_monitoreo = 'INFA-POSTANAEROBICA'
                        AND m.mot_porcentaje <= {mot_post} THEN 'CUMPLE'
                    WHEN ot.tipo_monitoreo = 'INFA'
                        AND m.mot_porcentaje <= {mot_infa} THEN 'CUMPLE'
                    WHEN ot.tipo_monitoreo IN ('INFA', 'INFA-POSTANAEROBICA') THEN 'NO CUMPLE'
                    ELSE 'NO APLICA'
                END AS cumplimiento_mot
            FROM sedimento_materia_organica m
            JOIN sedimento_estaciones e ON e.estacion_id = m.estacion_id
            JOIN ordenes_trabajo ot ON ot.ot_id = e.ot_id
            LEFT JOIN centros c ON c.centro_id = ot.centro_id
        "#,
            mot_post = MOT_MAX_POST,
            mot_infa = MOT_MAX_INFA,
        ))
        .execute(conn)?;

        diesel::sql_query(format!(
            r#"
            CREATE VIEW IF NOT EXISTS vista_cumplimiento_oxigeno AS
            SELECT
                c.codigo_centro,
                ot.codigo_ot,
                ot.tipo_monitoreo,
                p.codigo_perfil,
                om.profundidad_m,
                om.oxigeno_mg_l,
                om.temperatura_c,
                om.salinidad_psu,
                om.saturacion_pct,
                CASE
                    WHEN om.oxigeno_mg_l IS NULL THEN 'NO APLICA'
                    WHEN ot.tipo_monitoreo = 'INFA-POSTANAEROBICA'
                        AND om.oxigeno_mg_l >= {o2_post} THEN 'CUMPLE'
                    WHEN ot.tipo_monitoreo = 'INFA'
                        AND om.oxigeno_mg_l >= {o2_infa} THEN 'CUMPLE'
                    WHEN ot.tipo_monitoreo IN ('INFA', 'INFA-POSTANAEROBICA') THEN 'NO CUMPLE'
                    ELSE 'NO APLICA'
                END AS cumplimiento_oxigeno,
                CASE
                    WHEN om.oxigeno_mg_l IS NULL THEN NULL
                    WHEN om.oxigeno_mg_l < {banda_critico} THEN 'CRITICO'
                    WHEN om.oxigeno_mg_l < {banda_bajo} THEN 'BAJO'
                    WHEN om.oxigeno_mg_l < {banda_moderado} THEN 'MODERADO'
                    ELSE 'BUENO'
                END AS banda_oxigeno
            FROM oxigeno_mediciones om
            JOIN oxigeno_perfiles p ON p.perfil_id = om.perfil_id
            JOIN ordenes_trabajo ot ON ot.ot_id = p.ot_id
            LEFT JOIN centros c ON c.centro_id = ot.centro_id
            WHERE om.es_capa_z1 = 1
        "#,
            o2_post = OXIGENO_MIN_POST,
            o2_infa = OXIGENO_MIN_INFA,
            banda_critico = OXIGENO_BANDA_CRITICO,
            banda_bajo = OXIGENO_BANDA_BAJO,
            banda_moderado = OXIGENO_BANDA_MODERADO,
        ))
        .execute(conn)?;

        diesel::sql_query(format!(
            r#"
            CREATE VIEW IF NOT EXISTS vista_registro_visual AS
            SELECT
                c.codigo_centro,
                ot.codigo_ot,
                t.codigo_transecta,
                t.sustrato,
                t.presencia_matas,
                t.presencia_burbujas,
                a.grupo_taxonomico,
                a.especie,
                a.codigo_abundancia,
                CASE a.codigo_abundancia
                    WHEN 'R' THEN '{raro}'
                    WHEN 'E' THEN '{escaso}'
                    WHEN 'M' THEN '{moderado}'
                    WHEN 'A' THEN '{abundante}'
                    WHEN 'MA' THEN '{muy_abundante}'
                    WHEN '-' THEN '{ausente}'
                    ELSE 'No Determinado'
                END AS abundancia_descripcion,
                a.conteo_min,
                a.conteo_max
            FROM registro_visual_abundancia a
            JOIN registro_visual_transectas t ON t.transecta_id = a.transecta_id
            JOIN ordenes_trabajo ot ON ot.ot_id = t.ot_id
            LEFT JOIN centros c ON c.centro_id = ot.centro_id
        "#,
            raro = CodigoAbundancia::Raro.etiqueta(),
            escaso = CodigoAbundancia::Escaso.etiqueta(),
            moderado = CodigoAbundancia::Moderado.etiqueta(),
            abundante = CodigoAbundancia::Abundante.etiqueta(),
            muy_abundante = CodigoAbundancia::MuyAbundante.etiqueta(),
            ausente = CodigoAbundancia::Ausente.etiqueta(),
        ))
        .execute(conn)?;

        diesel::sql_query(format!(
            r#"
            CREATE VIEW IF NOT EXISTS vista_calidad_extraccion AS
            SELECT
                ot.codigo_ot,
                au.tabla_afectada,
                au.registros_esperados,
                au.registros_extraidos,
                au.porcentaje_completitud,
                au.valores_fuera_rango,
                au.requiere_revision,
                CASE
                    WHEN au.porcentaje_completitud IS NULL THEN 'DEFICIENTE'
                    WHEN au.porcentaje_completitud >= {excelente} THEN 'EXCELENTE'
                    WHEN au.porcentaje_completitud >= {bueno} THEN 'BUENO'
                    WHEN au.porcentaje_completitud >= {regular} THEN 'REGULAR'
                    ELSE 'DEFICIENTE'
                END AS calidad
            FROM auditoria_extraccion au
            JOIN ordenes_trabajo ot ON ot.ot_id = au.ot_id
        "#,
            excelente = COMPLETITUD_EXCELENTE,
            bueno = COMPLETITUD_BUENO,
            regular = COMPLETITUD_REGULAR,
        ))
        .execute(conn)?;

        Ok(())
    }

    fn seed_defaults(&self, conn: &mut SqliteConnection) -> Result<()> {
        for &(clave, valor, descripcion) in SEED_DEFAULTS {
            diesel::insert_or_ignore_into(configuracion_defaults::table)
                .values((
                    configuracion_defaults::clave.eq(clave),
                    configuracion_defaults::valor.eq(valor),
                    configuracion_defaults::descripcion.eq(descripcion),
                ))
                .execute(conn)?;
        }
        Ok(())
    }

    fn last_rowid(conn: &mut SqliteConnection) -> Result<i32> {
        let id: i32 = diesel::select(diesel::dsl::sql::<Integer>("last_insert_rowid()"))
            .first(conn)?;
        Ok(id)
    }

    // ========================================================================
    // Centros
    // ========================================================================

    /// Insert a new centro, returning its id
    pub fn insert_centro(&self, centro: &NewCentro) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(centros::table)
            .values(centro)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    /// Look a centro up by code, creating it with fallback values when
    /// missing. Mirrors what the ingestion side does for censored documents.
    pub fn get_or_create_centro(
        &self,
        codigo: &str,
        nombre: Option<&str>,
        es_censurado: bool,
    ) -> Result<i32> {
        if let Some(centro) = self.get_centro(codigo)? {
            return Ok(centro.centro_id);
        }

        let fallback = self.default_value("CENTRO_NOMBRE")?;
        let nombre_final = nombre
            .map(str::to_owned)
            .or(fallback)
            .unwrap_or_else(|| "CENTRO_SIN_NOMBRE".to_owned());

        let id = self.insert_centro(&NewCentro {
            codigo_centro: codigo,
            nombre_centro: &nombre_final,
            categoria: None,
            region: None,
            utm_este: None,
            utm_norte: None,
            es_censurado: es_censurado as i32,
        })?;
        info!("centro creado: {} (id {}, censurado: {})", codigo, id, es_censurado);
        Ok(id)
    }

    pub fn get_centro(&self, codigo: &str) -> Result<Option<Centro>> {
        let mut conn = self.get_conn()?;
        let centro = centros::table
            .filter(centros::codigo_centro.eq(codigo))
            .first::<Centro>(&mut conn)
            .optional()?;
        Ok(centro)
    }

    pub fn list_centros(&self) -> Result<Vec<Centro>> {
        let mut conn = self.get_conn()?;
        let rows = centros::table
            .order(centros::codigo_centro.asc())
            .load::<Centro>(&mut conn)?;
        Ok(rows)
    }

    /// Delete a centro; its work orders and all their measurements cascade
    pub fn delete_centro(&self, codigo: &str) -> Result<usize> {
        let mut conn = self.get_conn()?;
        let n = diesel::delete(centros::table.filter(centros::codigo_centro.eq(codigo)))
            .execute(&mut conn)?;
        Ok(n)
    }

    // ========================================================================
    // Ordenes de trabajo
    // ========================================================================

    pub fn insert_orden_trabajo(&self, ot: &NewOrdenTrabajo) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(ordenes_trabajo::table)
            .values(ot)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    pub fn get_orden_trabajo(&self, codigo_ot: &str) -> Result<Option<OrdenTrabajo>> {
        let mut conn = self.get_conn()?;
        let ot = ordenes_trabajo::table
            .filter(ordenes_trabajo::codigo_ot.eq(codigo_ot))
            .first::<OrdenTrabajo>(&mut conn)
            .optional()?;
        Ok(ot)
    }

    /// Delete a work order; stations, profiles, transects and their
    /// measurements cascade. The processing log is untouched.
    pub fn delete_orden_trabajo(&self, codigo_ot: &str) -> Result<usize> {
        let mut conn = self.get_conn()?;
        let n = diesel::delete(
            ordenes_trabajo::table.filter(ordenes_trabajo::codigo_ot.eq(codigo_ot)),
        )
        .execute(&mut conn)?;
        Ok(n)
    }

    // ========================================================================
    // Sediment domain
    // ========================================================================

    pub fn insert_estacion(&self, estacion: &NewEstacion) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(sedimento_estaciones::table)
            .values(estacion)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    pub fn insert_materia_organica(&self, muestra: &NewMateriaOrganica) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(sedimento_materia_organica::table)
            .values(muestra)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    pub fn insert_ph_redox(&self, muestra: &NewPhRedox) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(sedimento_ph_redox::table)
            .values(muestra)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    pub fn estaciones_de_ot(&self, ot_id: i32) -> Result<Vec<Estacion>> {
        let mut conn = self.get_conn()?;
        let rows = sedimento_estaciones::table
            .filter(sedimento_estaciones::ot_id.eq(ot_id))
            .order(sedimento_estaciones::codigo_estacion.asc())
            .load::<Estacion>(&mut conn)?;
        Ok(rows)
    }

    // ========================================================================
    // Oxygen domain
    // ========================================================================

    pub fn insert_perfil(&self, perfil: &NewPerfil) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(oxigeno_perfiles::table)
            .values(perfil)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    pub fn insert_medicion_oxigeno(&self, medicion: &NewMedicionOxigeno) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(oxigeno_mediciones::table)
            .values(medicion)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    pub fn perfiles_de_ot(&self, ot_id: i32) -> Result<Vec<Perfil>> {
        let mut conn = self.get_conn()?;
        let rows = oxigeno_perfiles::table
            .filter(oxigeno_perfiles::ot_id.eq(ot_id))
            .order(oxigeno_perfiles::codigo_perfil.asc())
            .load::<Perfil>(&mut conn)?;
        Ok(rows)
    }

    // ========================================================================
    // Visual survey domain
    // ========================================================================

    pub fn insert_transecta(&self, transecta: &NewTransecta) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(registro_visual_transectas::table)
            .values(transecta)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    pub fn insert_abundancia(&self, observacion: &NewAbundancia) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(registro_visual_abundancia::table)
            .values(observacion)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    pub fn transectas_de_ot(&self, ot_id: i32) -> Result<Vec<Transecta>> {
        let mut conn = self.get_conn()?;
        let rows = registro_visual_transectas::table
            .filter(registro_visual_transectas::ot_id.eq(ot_id))
            .order(registro_visual_transectas::codigo_transecta.asc())
            .load::<Transecta>(&mut conn)?;
        Ok(rows)
    }

    // ========================================================================
    // Audit & processing log
    // ========================================================================

    pub fn insert_auditoria(&self, auditoria: &NewAuditoria) -> Result<i32> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(auditoria_extraccion::table)
            .values(auditoria)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    /// Append a processing-log entry
    pub fn log_evento(
        &self,
        nivel: NivelLog,
        archivo_origen: Option<&str>,
        fase: Option<&str>,
        mensaje: &str,
    ) -> Result<i32> {
        let mut conn = self.get_conn()?;
        let entry = NewLogEntry {
            timestamp: chrono::Local::now().to_rfc3339(),
            nivel: nivel.as_str(),
            archivo_origen,
            fase,
            mensaje,
        };
        diesel::insert_into(log_procesamiento::table)
            .values(&entry)
            .execute(&mut conn)?;
        Self::last_rowid(&mut conn)
    }

    /// Most recent log entries, optionally filtered by level
    pub fn recent_log(&self, limit: i64, nivel: Option<NivelLog>) -> Result<Vec<LogEntry>> {
        let mut conn = self.get_conn()?;
        let rows = match nivel {
            Some(n) => log_procesamiento::table
                .filter(log_procesamiento::nivel.eq(n.as_str()))
                .order(log_procesamiento::log_id.desc())
                .limit(limit)
                .load::<LogEntry>(&mut conn)?,
            None => log_procesamiento::table
                .order(log_procesamiento::log_id.desc())
                .limit(limit)
                .load::<LogEntry>(&mut conn)?,
        };
        Ok(rows)
    }

    // ========================================================================
    // Default-value configuration
    // ========================================================================

    /// Fallback value for a key, None when the key is not configured
    pub fn default_value(&self, clave: &str) -> Result<Option<String>> {
        let mut conn = self.get_conn()?;
        let valor = configuracion_defaults::table
            .filter(configuracion_defaults::clave.eq(clave))
            .select(configuracion_defaults::valor)
            .first::<String>(&mut conn)
            .optional()?;
        Ok(valor)
    }

    /// Insert or replace a fallback value
    pub fn set_default_value(
        &self,
        clave: &str,
        valor: &str,
        descripcion: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.get_conn()?;
        diesel::replace_into(configuracion_defaults::table)
            .values((
                configuracion_defaults::clave.eq(clave),
                configuracion_defaults::valor.eq(valor),
                configuracion_defaults::descripcion.eq(descripcion),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn defaults(&self) -> Result<Vec<DefaultValue>> {
        let mut conn = self.get_conn()?;
        let rows = configuracion_defaults::table
            .order(configuracion_defaults::clave.asc())
            .load::<DefaultValue>(&mut conn)?;
        Ok(rows)
    }

    // ========================================================================
    // Reporting views
    // ========================================================================

    /// `vista_cumplimiento_sedimento`: MOT replicates classified against the
    /// protocol limit of their work order
    pub fn cumplimiento_sedimento(&self) -> Result<Vec<CumplimientoSedimento>> {
        let mut conn = self.get_conn()?;
        let rows = diesel::sql_query(
            "SELECT * FROM vista_cumplimiento_sedimento \
             ORDER BY codigo_ot, codigo_estacion, replica",
        )
        .load::<CumplimientoSedimento>(&mut conn)?;
        Ok(rows)
    }

    /// `vista_cumplimiento_oxigeno`: Z-1 layers classified and banded
    pub fn cumplimiento_oxigeno(&self) -> Result<Vec<CumplimientoOxigeno>> {
        let mut conn = self.get_conn()?;
        let rows = diesel::sql_query(
            "SELECT * FROM vista_cumplimiento_oxigeno ORDER BY codigo_ot, codigo_perfil",
        )
        .load::<CumplimientoOxigeno>(&mut conn)?;
        Ok(rows)
    }

    /// `vista_registro_visual`: abundance observations with glossary labels
    pub fn registro_visual(&self) -> Result<Vec<RegistroVisual>> {
        let mut conn = self.get_conn()?;
        let rows = diesel::sql_query(
            "SELECT * FROM vista_registro_visual \
             ORDER BY codigo_ot, codigo_transecta, codigo_abundancia",
        )
        .load::<RegistroVisual>(&mut conn)?;
        Ok(rows)
    }

    /// `vista_calidad_extraccion`: audit rows graded by completeness
    pub fn calidad_extraccion(&self) -> Result<Vec<CalidadExtraccionRow>> {
        let mut conn = self.get_conn()?;
        let rows = diesel::sql_query(
            "SELECT * FROM vista_calidad_extraccion ORDER BY codigo_ot, tabla_afectada",
        )
        .load::<CalidadExtraccionRow>(&mut conn)?;
        Ok(rows)
    }

    // ========================================================================
    // Counts
    // ========================================================================

    fn count(&self, table: &str) -> Result<i64> {
        let mut conn = self.get_conn()?;
        let row: CountRow =
            diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {}", table))
                .get_result(&mut conn)?;
        Ok(row.n)
    }

    /// Row counts per table, in dependency order
    pub fn table_counts(&self) -> Result<DbSummary> {
        Ok(DbSummary {
            centros: self.count("centros")?,
            ordenes_trabajo: self.count("ordenes_trabajo")?,
            sedimento_estaciones: self.count("sedimento_estaciones")?,
            sedimento_materia_organica: self.count("sedimento_materia_organica")?,
            sedimento_ph_redox: self.count("sedimento_ph_redox")?,
            oxigeno_perfiles: self.count("oxigeno_perfiles")?,
            oxigeno_mediciones: self.count("oxigeno_mediciones")?,
            registro_visual_transectas: self.count("registro_visual_transectas")?,
            registro_visual_abundancia: self.count("registro_visual_abundancia")?,
            auditoria_extraccion: self.count("auditoria_extraccion")?,
            log_procesamiento: self.count("log_procesamiento")?,
        })
    }
}

/// Row counts per table
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbSummary {
    pub centros: i64,
    pub ordenes_trabajo: i64,
    pub sedimento_estaciones: i64,
    pub sedimento_materia_organica: i64,
    pub sedimento_ph_redox: i64,
    pub oxigeno_perfiles: i64,
    pub oxigeno_mediciones: i64,
    pub registro_visual_transectas: i64,
    pub registro_visual_abundancia: i64,
    pub auditoria_extraccion: i64,
    pub log_procesamiento: i64,
}

/// Compute the load-time compliance flag pair for a MOT replicate, the way
/// the ingestion side stores them (one flag per protocol limit).
pub fn flags_mot(mot_porcentaje: Option<f64>) -> (Option<i32>, Option<i32>) {
    match mot_porcentaje {
        Some(v) => (
            Some(limits::cumple_mot_infa(v) as i32),
            Some(limits::cumple_mot_post(v) as i32),
        ),
        None => (None, None),
    }
}
