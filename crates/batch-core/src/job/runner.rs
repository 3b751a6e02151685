//! Orquestador: máquina de estados de una ejecución de job.
//!
//! `STARTING -> STARTED -> (steps) -> COMPLETED | FAILED | STOPPED`
//!
//! Los steps corren en secuencia estricta en el hilo del runner. Ningún
//! fault ni pánico de un colaborador escapa de `run`: todo termina en un
//! estado terminal más un registro en `failures`.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, error, info, warn};
use uuid::Uuid;

use super::definition::{Job, StepEntry};
use crate::clock::Clock;
use crate::context::ExecutionContext;
use crate::errors::{FaultKind, StepFault};
use crate::event::BatchEventKind;
use crate::execution::{BatchStatus, ExitStatus, JobExecution, StepExecution};
use crate::flow::{Route, Target};
use crate::repo::ExecutionRepository;
use crate::step::{ProgressSink, ScopeOutcome, StepScope, StopSignal};

/// Estado heredado de la ejecución previa (fallida o detenida) de la misma
/// instancia.
#[derive(Debug, Clone, Default)]
pub struct RestartState {
    pub is_restart: bool,
    pub job_context: ExecutionContext,
    /// Steps ya COMPLETED en la instancia: se omiten y su exit code se
    /// reutiliza para enrutar.
    pub completed_steps: HashMap<String, StepExecution>,
    /// Contexto del último intento no completado de cada step.
    pub step_contexts: HashMap<String, ExecutionContext>,
}

pub struct JobRunner {
    job: Arc<Job>,
    repository: Arc<dyn ExecutionRepository>,
    clock: Arc<dyn Clock>,
    stop: StopSignal,
}

/// Persiste el progreso de los chunks y emite sus eventos.
struct RepositorySink<'r> {
    repository: &'r dyn ExecutionRepository,
    clock: &'r dyn Clock,
    job_execution_id: Uuid,
}

impl ProgressSink for RepositorySink<'_> {
    fn step_progress(&mut self, step: &StepExecution) -> Result<(), StepFault> {
        self.repository.save_step_execution(step).map_err(StepFault::from)
    }
    fn emit(&mut self, kind: BatchEventKind) {
        emit(self.repository, self.clock, self.job_execution_id, kind);
    }
}

fn emit(repository: &dyn ExecutionRepository, clock: &dyn Clock, id: Uuid, kind: BatchEventKind) {
    if let Err(e) = repository.append_event(id, kind, clock.wall()) {
        warn!("event not recorded for execution {id}: {e}");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn guarded<R>(what: &str, f: impl FnOnce() -> R) -> Result<R, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|p| format!("{what} panicked: {}", panic_message(p.as_ref())))
}

/// Final implícito: el job hereda el resultado del último step.
fn implicit_outcome(step: &StepExecution) -> (BatchStatus, ExitStatus) {
    if step.status == BatchStatus::Failed || step.exit_status.is_failed() {
        let exit = if step.exit_status.is_failed() { step.exit_status.clone() } else { ExitStatus::failed() };
        (BatchStatus::Failed, exit)
    } else {
        (BatchStatus::Completed, step.exit_status.clone())
    }
}

impl JobRunner {
    pub fn new(job: Arc<Job>, repository: Arc<dyn ExecutionRepository>, clock: Arc<dyn Clock>, stop: StopSignal) -> Self {
        Self { job,
               repository,
               clock,
               stop }
    }

    fn emit(&self, id: Uuid, kind: BatchEventKind) {
        emit(self.repository.as_ref(), self.clock.as_ref(), id, kind);
    }

    fn persist_job(&self, execution: &mut JobExecution) {
        if let Err(e) = self.repository.update_job_execution(execution) {
            error!("job execution {} not persisted: {e}", execution.id);
            execution.failures.push(format!("repository: {e}"));
        }
    }

    /// Ejecuta el job hasta un estado terminal y devuelve el registro final.
    pub fn run(&self, mut execution: JobExecution, restart: RestartState) -> JobExecution {
        execution.start_time = Some(self.clock.wall());
        execution.status = BatchStatus::Started;
        execution.exit_status = ExitStatus::executing();
        execution.context = restart.job_context.clone();
        info!("job '{}' execution {} started (restart={})", execution.job_name, execution.id, restart.is_restart);

        let mut aborted = false;
        for l in self.job.listeners() {
            if let Err(msg) = guarded("before_job", || l.before_job(&execution)) {
                error!("{msg}");
                execution.failures.push(msg);
                aborted = true;
            }
        }
        self.persist_job(&mut execution);
        self.emit(execution.id,
                  BatchEventKind::JobStarted { job_name: execution.job_name.clone(),
                                               identity_hash: execution.identity_hash.clone(),
                                               restart: restart.is_restart });

        let (status, exit) = if aborted {
            (BatchStatus::Failed, ExitStatus::failed().with_description("before_job listener failed"))
        } else {
            self.run_flow(&mut execution, restart)
        };
        execution.status = status;
        execution.exit_status = exit;
        execution.end_time = Some(self.clock.wall());

        for l in self.job.listeners() {
            if let Err(msg) = guarded("after_job", || l.after_job(&execution)) {
                error!("{msg}");
                execution.failures.push(msg);
            }
        }
        self.emit(execution.id,
                  BatchEventKind::JobFinished { status: execution.status,
                                                exit_code: execution.exit_status.exit_code.clone() });
        self.persist_job(&mut execution);
        info!("job '{}' execution {} finished: {} ({})",
              execution.job_name,
              execution.id,
              execution.status,
              execution.exit_status);
        execution
    }

    fn run_flow(&self, execution: &mut JobExecution, restart: RestartState) -> (BatchStatus, ExitStatus) {
        let flow = self.job.flow();
        let mut completed = restart.completed_steps;
        let mut step_contexts = restart.step_contexts;
        let mut current = flow.start().to_string();
        loop {
            if self.stop.is_requested() {
                info!("job '{}': stop requested before step '{current}'", execution.job_name);
                return (BatchStatus::Stopped, ExitStatus::stopped());
            }
            let Some(entry) = self.job.step(&current) else {
                let msg = format!("step '{current}' is not defined");
                execution.failures.push(msg.clone());
                return (BatchStatus::Failed, ExitStatus::failed().with_description(msg));
            };
            let step = match completed.remove(&current) {
                Some(done) => {
                    debug!("step '{current}' already completed in this instance; skipping");
                    self.emit(execution.id,
                              BatchEventKind::StepSkipped { step_name: current.clone(),
                                                            exit_code: done.exit_status.exit_code.clone() });
                    done
                }
                None => self.execute_step(execution, &current, entry, step_contexts.remove(&current)),
            };
            if step.status == BatchStatus::Stopped {
                return (BatchStatus::Stopped, ExitStatus::stopped());
            }
            let exit_code = step.exit_status.exit_code.clone();
            match flow.route(&current, &exit_code) {
                Route::Edge(t) => {
                    debug!("transition {current} -[{}]-> {}", t.pattern, t.target);
                    self.emit(execution.id,
                              BatchEventKind::TransitionTaken { from: current.clone(),
                                                                exit_code: exit_code.clone(),
                                                                to: t.target.to_string() });
                    match &t.target {
                        Target::Step(next) => current = next.clone(),
                        Target::End { exit_code: code } => {
                            return (BatchStatus::Completed, code.as_ref().map(ExitStatus::new).unwrap_or_else(ExitStatus::completed));
                        }
                        Target::Fail => return (BatchStatus::Failed, ExitStatus::failed()),
                        Target::Stop => return (BatchStatus::Stopped, ExitStatus::stopped()),
                    }
                }
                Route::Implicit => return implicit_outcome(&step),
                Route::DeadEnd => {
                    let msg = format!("no transition from '{current}' matches exit code '{exit_code}'");
                    error!("job '{}': {msg}", execution.job_name);
                    execution.failures.push(msg.clone());
                    return (BatchStatus::Failed, ExitStatus::failed().with_description(msg));
                }
            }
        }
    }

    fn execute_step(&self,
                    execution: &mut JobExecution,
                    name: &str,
                    entry: &StepEntry,
                    previous_context: Option<ExecutionContext>)
                    -> StepExecution {
        let mut step = StepExecution::new(execution.id, name);
        step.start_time = Some(self.clock.wall());
        step.status = BatchStatus::Started;
        if let Some(ctx) = previous_context {
            step.context = ctx;
        }
        if let Err(e) = self.repository.save_step_execution(&step) {
            warn!("step '{name}' start not persisted: {e}");
        }
        self.emit(execution.id, BatchEventKind::StepStarted { step_name: name.to_string() });
        for l in &entry.listeners {
            if let Err(msg) = guarded("before_step", || l.before_step(&step)) {
                warn!("{msg}");
                step.failures.push(msg);
            }
        }

        let mut sink = RepositorySink { repository: self.repository.as_ref(),
                                        clock: self.clock.as_ref(),
                                        job_execution_id: execution.id };
        let params = &execution.parameters;
        let job_context = &mut execution.context;
        let result = catch_unwind(AssertUnwindSafe(|| -> Result<ScopeOutcome, StepFault> {
                         let mut runnable = (entry.factory)(params)?;
                         let mut scope = StepScope::new(self.job.name(),
                                                        params,
                                                        &mut step,
                                                        job_context,
                                                        &self.stop,
                                                        self.clock.as_ref(),
                                                        &mut sink);
                         runnable.execute(&mut scope)?;
                         Ok(scope.finish())
                     }));
        let outcome = result.unwrap_or_else(|p| Err(StepFault::new(FaultKind::Panic, panic_message(p.as_ref()))));

        match outcome {
            Ok(o) if o.stopped => {
                step.status = BatchStatus::Stopped;
                step.exit_status = ExitStatus::stopped();
            }
            Ok(o) => {
                step.status = BatchStatus::Completed;
                step.exit_status = o.exit_status.unwrap_or_else(ExitStatus::completed);
            }
            Err(fault) => {
                error!("step '{name}' failed: {fault}");
                step.status = BatchStatus::Failed;
                step.exit_status = ExitStatus::failed().with_description(fault.to_string());
                step.failures.push(fault.to_string());
                execution.failures.push(format!("{name}: {fault}"));
            }
        }
        step.end_time = Some(self.clock.wall());

        let before = execution.context.clone();
        for l in entry.listeners.iter().rev() {
            match guarded("after_step", || l.after_step(&step, &mut execution.context)) {
                Ok(Some(exit)) => step.exit_status = exit,
                Ok(None) => {}
                Err(msg) => {
                    warn!("{msg}");
                    step.failures.push(msg);
                }
            }
        }
        let promoted: Vec<String> = execution.context
                                             .keys()
                                             .filter(|k| before.get(k) != execution.context.get(k))
                                             .map(str::to_string)
                                             .collect();
        if !promoted.is_empty() {
            self.emit(execution.id,
                      BatchEventKind::ContextPromoted { step_name: name.to_string(),
                                                        keys: promoted });
        }

        if let Err(e) = self.repository.save_step_execution(&step) {
            error!("step '{name}' not persisted: {e}");
            execution.failures.push(format!("repository: {e}"));
        }
        self.emit(execution.id,
                  BatchEventKind::StepFinished { step_name: name.to_string(),
                                                 status: step.status,
                                                 exit_code: step.exit_status.exit_code.clone() });
        self.persist_job(execution);
        step
    }
}
