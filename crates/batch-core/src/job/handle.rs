use std::sync::Arc;
use std::thread::JoinHandle;

use uuid::Uuid;

use crate::errors::BatchError;
use crate::execution::{BatchStatus, JobExecution, JobReport};
use crate::repo::ExecutionRepository;
use crate::step::StopSignal;

/// Handle de una ejecución lanzada en segundo plano.
///
/// La inspección (`status`, `snapshot`) lee del repositorio, nunca del estado
/// del hilo en ejecución.
pub struct JobExecutionHandle {
    execution_id: Uuid,
    job_name: String,
    stop: StopSignal,
    repository: Arc<dyn ExecutionRepository>,
    join: JoinHandle<JobExecution>,
}

impl JobExecutionHandle {
    pub(crate) fn new(execution_id: Uuid,
                      job_name: String,
                      stop: StopSignal,
                      repository: Arc<dyn ExecutionRepository>,
                      join: JoinHandle<JobExecution>)
                      -> Self {
        Self { execution_id,
               job_name,
               stop,
               repository,
               join }
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Pide la parada; el job termina STOPPED tras la unidad atómica en curso.
    pub fn stop(&self) {
        self.stop.request();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn status(&self) -> Result<Option<BatchStatus>, BatchError> {
        Ok(self.repository.get_job_execution(self.execution_id)?.map(|e| e.status))
    }

    /// Reporte con los contadores persistidos hasta el último commit.
    pub fn snapshot(&self) -> Result<Option<JobReport>, BatchError> {
        let Some(job) = self.repository.get_job_execution(self.execution_id)? else {
            return Ok(None);
        };
        let steps = self.repository.step_executions(self.execution_id)?;
        Ok(Some(JobReport::new(&job, &steps)))
    }

    /// Bloquea hasta el estado terminal.
    pub fn wait(self) -> Result<JobExecution, BatchError> {
        match self.join.join() {
            Ok(execution) => Ok(execution),
            Err(_) => self.repository
                          .get_job_execution(self.execution_id)?
                          .ok_or_else(|| BatchError::Repository(format!("execution {} lost", self.execution_id))),
        }
    }
}
