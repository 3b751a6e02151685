//! Hooks de job y de step.
//!
//! Los listeners se comparten entre ejecuciones (`Arc`), por eso reciben
//! `&self`: cualquier estado por ejecución (instantes de inicio, contadores)
//! se lee del registro de ejecución, nunca de campos del listener.

mod performance;

pub use performance::PerformanceListener;

use crate::context::ExecutionContext;
use crate::execution::{ExitStatus, JobExecution, StepExecution};

pub trait StepListener: Send + Sync {
    fn before_step(&self, _step: &StepExecution) {}

    /// Se invoca con el estado terminal del step ya fijado. Puede escribir
    /// en el contexto del job y sustituir la señal de salida.
    fn after_step(&self, _step: &StepExecution, _job_context: &mut ExecutionContext) -> Option<ExitStatus> {
        None
    }
}

pub trait JobListener: Send + Sync {
    fn before_job(&self, _job: &JobExecution) {}
    /// Se invoca exactamente una vez, sea cual sea el estado terminal.
    fn after_job(&self, _job: &JobExecution) {}
}
