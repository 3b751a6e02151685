//! Implementación SQLite (Diesel) del `ExecutionRepository` del core.
//!
//! - Un pool r2d2 con un customizer que fija `busy_timeout`, claves foráneas
//!   y modo WAL en cada conexión nueva.
//! - Las migraciones embebidas corren una vez al construir el pool.
//! - Check-and-create de ejecuciones, numeración de eventos y upsert de steps
//!   corren dentro de `BEGIN IMMEDIATE`, de modo que dos procesos que lanzan
//!   la misma instancia a la vez se serializan en el lock de escritura.
//! - Errores transitorios (busy/locked, pool) se reintentan con backoff corto.

mod repository;
mod rows;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use log::{info, warn};
use r2d2::CustomizeConnection;

use crate::config::DbConfig;
use crate::error::{is_busy_message, PersistenceError};
use crate::migrations::run_pending_migrations;

pub use repository::{event_type_for, SqliteExecutionRepository};
pub use rows::{EventRow, JobExecutionRecord, JobExecutionRow, NewEventRow, StepExecutionRecord, StepExecutionRow};

/// Alias de tipo para el pool r2d2 de conexiones SQLite.
pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

pub type SqlitePooledConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar el pool real o, en tests, un proveedor que falle a
/// voluntad sin acoplar el repositorio a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<SqlitePooledConnection, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `SqlitePool`.
pub struct PoolProvider {
    pub pool: SqlitePool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<SqlitePooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// PRAGMAs por conexión. SQLite los aplica por conexión, no por fichero
/// (salvo `journal_mode`, que persiste).
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout_ms: u64,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!("PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;",
                                    self.busy_timeout_ms))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Determina si un error es transitorio (recomendado reintentar con backoff).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::Busy(_) => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => is_busy_message(msg),
        _ => false,
    }
}

/// Retry simple con backoff lineal muy pequeño (hasta 3 reintentos).
///
/// Política:
/// - Backoff: 15ms, 30ms, 45ms.
/// - Logs: se emite `warn!` por intento.
///
/// No altera semántica: sólo repite la unidad de trabajo provista por `f`,
/// que debe ser una transacción completa.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Construye el pool y corre las migraciones pendientes una sola vez.
pub fn build_pool(cfg: &DbConfig) -> Result<SqlitePool, PersistenceError> {
    let max_size = if cfg.max_connections == 0 {
        warn!("max_connections=0, usando 1");
        1
    } else {
        cfg.max_connections
    };
    let manager = ConnectionManager::<SqliteConnection>::new(cfg.url.as_str());
    let pool = Pool::builder().min_idle(Some(1))
                              .max_size(max_size)
                              .connection_customizer(Box::new(SqlitePragmas { busy_timeout_ms: cfg.busy_timeout_ms }))
                              .build(manager)
                              .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    info!("sqlite pool ready url={} max_size={}", cfg.url, max_size);
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<SqlitePool, PersistenceError> {
    crate::config::init_dotenv();
    build_pool(&DbConfig::from_env())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retries_busy_then_succeeds() {
        let calls = Cell::new(0);
        let out = with_retry(|| {
                      calls.set(calls.get() + 1);
                      if calls.get() < 3 {
                          Err(PersistenceError::Busy("database is locked".into()))
                      } else {
                          Ok(7)
                      }
                  });
        assert_eq!(out.expect("ok after retries"), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn does_not_retry_constraint_errors() {
        let calls = Cell::new(0);
        let out: Result<(), _> = with_retry(|| {
                                     calls.set(calls.get() + 1);
                                     Err(PersistenceError::UniqueViolation("id".into()))
                                 });
        assert!(matches!(out, Err(PersistenceError::UniqueViolation(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn gives_up_after_three_retries() {
        let calls = Cell::new(0);
        let out: Result<(), _> = with_retry(|| {
                                     calls.set(calls.get() + 1);
                                     Err(PersistenceError::TransientIo("pool".into()))
                                 });
        assert!(out.is_err());
        assert_eq!(calls.get(), 4);
    }
}
