//! batchflow
//!
//! Punto de ensamblaje de la aplicación:
//! - `config`: ajustes de los jobs leídos del entorno.
//! - `app`: repositorio SQLite + launcher con los jobs registrados.
//! - `logging`: instalación del subscriber de `tracing`.

pub mod app;
pub mod config;
pub mod logging;

pub use app::{App, AppError};
pub use config::{BatchConfig, CONFIG};
