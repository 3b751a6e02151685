//! Constantes globales del motor.

pub const ENGINE_VERSION: &str = "batchflow-0.1";

/// Límite de re-invocaciones de un tasklet `Continuable` por ejecución de step.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Exit codes del vocabulario cerrado.
pub const EXIT_COMPLETED: &str = "COMPLETED";
pub const EXIT_FAILED: &str = "FAILED";
pub const EXIT_STOPPED: &str = "STOPPED";
pub const EXIT_NOOP: &str = "NOOP";
pub const EXIT_UNKNOWN: &str = "UNKNOWN";
pub const EXIT_EXECUTING: &str = "EXECUTING";

/// Clave que los readers con estado usan en el contexto del step.
pub const READ_COUNT_KEY: &str = "reader.read.count";
