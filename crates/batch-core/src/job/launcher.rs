//! Punto de entrada: `start(job_name, params)`.
//!
//! Orden: resolver identidad -> rechazar duplicado/en curso -> validar ->
//! crear fila (check-and-create atómico) -> preparar reinicio -> ejecutar.
//! Los rechazos son síncronos y no crean filas.

use std::sync::Arc;

use log::{error, info};

use super::{Job, JobExecutionHandle, JobRegistry, JobRunner, RestartState};
use crate::clock::{Clock, SystemClock};
use crate::errors::BatchError;
use crate::execution::{BatchStatus, ExitStatus, JobExecution};
use crate::params::{IdentityResolver, JobIdentity, ParameterSet};
use crate::repo::{check_instance, ExecutionRepository};
use crate::step::StopSignal;

pub struct JobLauncher {
    repository: Arc<dyn ExecutionRepository>,
    clock: Arc<dyn Clock>,
    registry: JobRegistry,
}

impl JobLauncher {
    pub fn new(repository: Arc<dyn ExecutionRepository>) -> Self {
        Self { repository,
               clock: Arc::new(SystemClock),
               registry: JobRegistry::new() }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_job(mut self, job: Job) -> Self {
        self.registry.register(job);
        self
    }

    pub fn register(&mut self, job: Job) {
        self.registry.register(job);
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn repository(&self) -> Arc<dyn ExecutionRepository> {
        self.repository.clone()
    }

    /// Lanza el job en un hilo propio y devuelve un handle.
    pub fn start(&self, job_name: &str, params: ParameterSet) -> Result<JobExecutionHandle, BatchError> {
        let job = self.registry.get(job_name).ok_or_else(|| BatchError::UnknownJob(job_name.to_string()))?;
        let (execution, restart) = self.prepare(&job, &params)?;
        let stop = StopSignal::new();
        let runner = JobRunner::new(job, self.repository.clone(), self.clock.clone(), stop.clone());
        let id = execution.id;
        let mut fallback = execution.clone();
        let spawned = std::thread::Builder::new().name(format!("job-{job_name}"))
                                                 .spawn(move || runner.run(execution, restart));
        match spawned {
            Ok(join) => Ok(JobExecutionHandle::new(id, job_name.to_string(), stop, self.repository.clone(), join)),
            Err(e) => {
                error!("job '{job_name}': cannot spawn worker thread: {e}");
                fallback.status = BatchStatus::Failed;
                fallback.exit_status = ExitStatus::failed().with_description(e.to_string());
                fallback.end_time = Some(self.clock.wall());
                fallback.failures.push(format!("launch: {e}"));
                self.repository.update_job_execution(&fallback)?;
                Err(BatchError::Launch(e.to_string()))
            }
        }
    }

    /// Variante síncrona: ejecuta en el hilo llamador.
    pub fn run(&self, job_name: &str, params: ParameterSet) -> Result<JobExecution, BatchError> {
        let job = self.registry.get(job_name).ok_or_else(|| BatchError::UnknownJob(job_name.to_string()))?;
        let (execution, restart) = self.prepare(&job, &params)?;
        let runner = JobRunner::new(job, self.repository.clone(), self.clock.clone(), StopSignal::new());
        Ok(runner.run(execution, restart))
    }

    fn prepare(&self, job: &Job, params: &ParameterSet) -> Result<(JobExecution, RestartState), BatchError> {
        let last = self.repository.last_job_execution(job.name())?;
        let resolved = IdentityResolver::resolve(job.name(), params, last.as_ref().map(|e| &e.parameters), job.incrementer());
        let hash = JobIdentity::new(job.name(), resolved.clone()).hash();

        let prior = self.repository.find_job_executions(&hash)?;
        check_instance(job.name(), &hash, &prior)?;
        if let Some(v) = job.validator() {
            v.validate(&resolved)?;
        }

        let execution = JobExecution::new(job.name(), hash, resolved, self.clock.wall());
        self.repository.create_job_execution(&execution)?;
        let restart = self.restart_state(job, &prior)?;
        info!("job '{}' accepted: execution={} identity={} restart={}",
              job.name(),
              execution.id,
              execution.identity_hash,
              restart.is_restart);
        Ok((execution, restart))
    }

    fn restart_state(&self, job: &Job, prior: &[JobExecution]) -> Result<RestartState, BatchError> {
        let Some(last) = prior.last() else {
            return Ok(RestartState::default());
        };
        let mut state = RestartState { is_restart: true,
                                       job_context: last.context.clone(),
                                       ..RestartState::default() };
        for name in job.step_names() {
            let Some(step) = self.repository.last_step_execution(&last.identity_hash, name)? else {
                continue;
            };
            if step.status == BatchStatus::Completed {
                state.completed_steps.insert(name.to_string(), step);
            } else {
                state.step_contexts.insert(name.to_string(), step.context);
            }
        }
        Ok(state)
    }
}
