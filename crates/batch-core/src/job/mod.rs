//! Definición de jobs, orquestador y punto de entrada.

mod definition;
mod handle;
mod launcher;
mod registry;
mod runner;

pub use definition::{Job, JobBuilder, StepEntry, StepFactory};
pub use handle::JobExecutionHandle;
pub use launcher::JobLauncher;
pub use registry::JobRegistry;
pub use runner::{JobRunner, RestartState};
