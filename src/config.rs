//! Configuración de los jobs de la aplicación.
//! Se lee una sola vez del entorno (.env incluido) y se expone en `CONFIG`.
use std::env;

use batch_adapters::JobSettings;
use log::warn;
use once_cell::sync::Lazy;

pub const DEFAULT_CHUNK_SIZE: usize = 10;
pub const DEFAULT_CHUNK_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_INPUT_ROWS: usize = 100;
pub const DEFAULT_API_LATENCY_MS: u64 = 150;

/// Ajustes del job de procesamiento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Items por chunk (`BATCH_CHUNK_SIZE`).
    pub chunk_size: usize,
    /// Tiempo máximo por chunk en ms (`BATCH_CHUNK_TIMEOUT_MS`).
    pub chunk_timeout_ms: u64,
    /// Filas sembradas si la tabla de entrada está vacía (`BATCH_INPUT_ROWS`).
    pub input_rows: usize,
    /// Latencia simulada de la API externa (`BATCH_API_LATENCY_MS`).
    pub api_latency_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE,
               chunk_timeout_ms: DEFAULT_CHUNK_TIMEOUT_MS,
               input_rows: DEFAULT_INPUT_ROWS,
               api_latency_ms: DEFAULT_API_LATENCY_MS }
    }
}

impl BatchConfig {
    pub fn from_env() -> Self {
        batch_persistence::init_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let d = Self::default();
        Self { chunk_size: read(&lookup, "BATCH_CHUNK_SIZE", d.chunk_size),
               chunk_timeout_ms: read(&lookup, "BATCH_CHUNK_TIMEOUT_MS", d.chunk_timeout_ms),
               input_rows: read(&lookup, "BATCH_INPUT_ROWS", d.input_rows),
               api_latency_ms: read(&lookup, "BATCH_API_LATENCY_MS", d.api_latency_ms) }
    }

    pub fn job_settings(&self) -> JobSettings {
        JobSettings { chunk_size: self.chunk_size,
                      chunk_timeout_ms: self.chunk_timeout_ms,
                      input_rows: self.input_rows,
                      api_latency_ms: self.api_latency_ms,
                      ..JobSettings::default() }
    }
}

/// Instancia global perezosa, evaluada una sola vez.
pub static CONFIG: Lazy<BatchConfig> = Lazy::new(BatchConfig::from_env);

fn read<F, T>(lookup: &F, key: &str, default: T) -> T
    where F: Fn(&str) -> Option<String>,
          T: std::str::FromStr + std::fmt::Display + Copy
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
                          warn!("{key}={raw:?} is not valid, using {default}");
                          default
                      })
}
