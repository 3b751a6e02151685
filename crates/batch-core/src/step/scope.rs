use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::context::{ContextView, ExecutionContext};
use crate::errors::StepFault;
use crate::event::BatchEventKind;
use crate::execution::{ExitStatus, StepExecution};
use crate::params::ParameterSet;

/// Bandera de parada compartida entre el handle y el hilo del job.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Destino del progreso intermedio de un step (persistencia + eventos).
pub trait ProgressSink {
    fn step_progress(&mut self, step: &StepExecution) -> Result<(), StepFault>;
    fn emit(&mut self, kind: BatchEventKind);
}

/// Resultado de un step que no terminó con fault.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeOutcome {
    pub stopped: bool,
    pub exit_status: Option<ExitStatus>,
}

pub struct StepScope<'a> {
    job_name: &'a str,
    parameters: &'a ParameterSet,
    step: &'a mut StepExecution,
    job_context: &'a mut ExecutionContext,
    stop: &'a StopSignal,
    clock: &'a dyn Clock,
    sink: &'a mut dyn ProgressSink,
    outcome: ScopeOutcome,
}

impl<'a> StepScope<'a> {
    pub fn new(job_name: &'a str,
               parameters: &'a ParameterSet,
               step: &'a mut StepExecution,
               job_context: &'a mut ExecutionContext,
               stop: &'a StopSignal,
               clock: &'a dyn Clock,
               sink: &'a mut dyn ProgressSink)
               -> Self {
        Self { job_name,
               parameters,
               step,
               job_context,
               stop,
               clock,
               sink,
               outcome: ScopeOutcome::default() }
    }

    pub fn job_name(&self) -> &str {
        self.job_name
    }

    pub fn step_name(&self) -> &str {
        &self.step.step_name
    }

    pub fn parameters(&self) -> &ParameterSet {
        self.parameters
    }

    /// Contadores y metadatos actuales (sólo lectura).
    pub fn step_execution(&self) -> &StepExecution {
        self.step
    }

    pub fn step_context(&self) -> &ExecutionContext {
        &self.step.context
    }

    pub fn step_context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.step.context
    }

    /// Instantánea del contexto del job. Escribir requiere `job_context_mut`.
    pub fn job_context_view(&self) -> ContextView {
        self.job_context.view()
    }

    pub fn job_context_mut(&mut self) -> &mut ExecutionContext {
        self.job_context
    }

    /// Fija la señal de salida sin lanzar un fault (p.ej. `FAILED` deliberado
    /// para enrutar el flujo).
    pub fn set_exit_status(&mut self, exit: ExitStatus) {
        self.outcome.exit_status = Some(exit);
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_requested()
    }

    /// El step termina STOPPED tras la unidad atómica en curso.
    pub fn mark_stopped(&mut self) {
        self.outcome.stopped = true;
    }

    /// Confirma un chunk: aplica contadores, persiste el step y emite
    /// `ChunkCommitted`.
    pub fn record_commit(&mut self, read: usize, written: usize, skipped: usize) -> Result<(), StepFault> {
        self.step.read_count += read as u64;
        self.step.write_count += written as u64;
        self.step.skip_count += skipped as u64;
        self.step.commit_count += 1;
        self.sink.step_progress(self.step)?;
        let commit = self.step.commit_count;
        let step_name = self.step.step_name.clone();
        self.sink.emit(BatchEventKind::ChunkCommitted { step_name,
                                                        commit,
                                                        read,
                                                        written });
        Ok(())
    }

    /// Una iteración de tasklet cuenta como un commit (sin evento de chunk).
    pub fn record_iteration(&mut self) -> Result<(), StepFault> {
        self.step.commit_count += 1;
        self.sink.step_progress(self.step)
    }

    pub fn record_rollback(&mut self, reason: &str) {
        self.step.rollback_count += 1;
        let step_name = self.step.step_name.clone();
        self.sink.emit(BatchEventKind::ChunkRolledBack { step_name,
                                                         reason: reason.to_string() });
    }

    pub fn finish(self) -> ScopeOutcome {
        self.outcome
    }
}
