//! Log de eventos append-only por ejecución de job.

mod types;

pub use types::{event_codes, BatchEvent, BatchEventKind};
