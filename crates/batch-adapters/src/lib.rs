//! batch-adapters: colaboradores concretos del motor batch.
//!
//! Este crate provee:
//! - Entidades `BatchInput` / `BatchOutput` y tablas en memoria compartidas.
//! - `TableReader` (reanudable), `ApiCallProcessor` (API externa simulada) y
//!   `TableWriter`.
//! - Los tasklets de demostración y los validadores por modo.
//! - Las definiciones de job listas para registrar en un `JobLauncher`.

pub mod entities;
pub mod jobs;
pub mod processor;
pub mod reader;
pub mod table;
pub mod tasklets;
pub mod validators;
pub mod writer;

pub use entities::{BatchInput, BatchOutput};
pub use jobs::{register_demo_jobs, DemoResources, JobSettings};
pub use processor::{ApiCallProcessor, ExternalApi, SimulatedApi};
pub use reader::TableReader;
pub use table::{InputTable, OutputTable};
pub use writer::TableWriter;
