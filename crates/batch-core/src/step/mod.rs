//! Executors de step.
//!
//! Dos tipos de step, ambos producen una señal de salida terminal:
//! - `TaskletStep`: una unidad de trabajo, re-invocada mientras devuelva
//!   `RepeatStatus::Continuable` (con límite de iteraciones).
//! - `ChunkStep`: ciclo read -> process -> write por chunks transaccionales
//!   gobernados por una `CompletionPolicy`.
//!
//! El orquestador crea un `StepScope` por ejecución de step; el step sólo ve
//! el mundo a través de él.

mod callable;
mod chunk;
mod item;
mod scope;
mod tasklet;

pub use callable::CallableTasklet;
pub use chunk::{ChunkStep, ChunkStepBuilder};
pub use item::{ItemProcessor, ItemReader, ItemWriter, IterReader, PassThroughProcessor};
pub use scope::{ProgressSink, ScopeOutcome, StepScope, StopSignal};
pub use tasklet::{FnTasklet, RepeatStatus, Tasklet, TaskletStep};

use crate::errors::StepFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Tasklet,
    Chunk,
}

pub trait Step: Send {
    fn kind(&self) -> StepKind;
    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<(), StepFault>;
}
