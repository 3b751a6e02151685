//! batch-persistence
//!
//! Repositorio de ejecuciones durable sobre SQLite (Diesel + r2d2).
//!
//! Módulos:
//! - `sqlite`: pool, reintentos y `SqliteExecutionRepository`.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use sqlite::{build_pool, build_pool_from_env, ConnectionProvider, PoolProvider, SqliteExecutionRepository, SqlitePool};
