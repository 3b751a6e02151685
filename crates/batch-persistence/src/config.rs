//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` (ruta del fichero SQLite) y parámetros
//! opcionales de pool.

use std::env;

use dotenvy::dotenv;
use log::warn;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_DATABASE_URL: &str = "batchflow.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    /// `PRAGMA busy_timeout` aplicado a cada conexión.
    pub busy_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { url: DEFAULT_DATABASE_URL.to_string(),
               max_connections: DEFAULT_MAX_CONNECTIONS,
               busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS }
    }
}

impl DbConfig {
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("DATABASE_URL").ok()
                                          .filter(|v| !v.trim().is_empty())
                                          .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let busy_timeout_ms = parse_var("DATABASE_BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS);
        Self { url,
               max_connections,
               busy_timeout_ms }
    }

    /// Configuración por defecto apuntando a otro fichero (tests, CLI).
    pub fn for_path(path: impl Into<String>) -> Self {
        Self { url: path.into(),
               ..Self::default() }
    }
}

fn parse_var<T>(key: &str, default: T) -> T
    where T: std::str::FromStr + std::fmt::Display + Copy
{
    match env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
    where T: std::str::FromStr + std::fmt::Display + Copy
{
    raw.trim().parse().unwrap_or_else(|_| {
                          warn!("{key}={raw:?} no es válido, usando {default}");
                          default
                      })
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
