//! `ExecutionRepository`: qué se guarda y cuándo.
//!
//! - Fila de job al crear (STARTING), al arrancar, en cada frontera de step y
//!   al terminar.
//! - Fila de step al empezar, tras cada commit y al terminar (upsert).
//! - El contexto del job sólo se persiste mientras la ejecución no haya
//!   terminado COMPLETED; una ejecución completada lo vacía.
//! - `create_job_execution` es el único punto con concurrencia entre
//!   ejecuciones: comprobar duplicado y crear debe ser atómico.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::event::{BatchEvent, BatchEventKind};
use crate::execution::{BatchStatus, JobExecution, StepExecution};

pub trait ExecutionRepository: Send + Sync {
    /// Ejecución más reciente de un job (cualquier instancia).
    fn last_job_execution(&self, job_name: &str) -> Result<Option<JobExecution>, RepositoryError>;

    /// Ejecuciones de una instancia, de la más antigua a la más reciente.
    fn find_job_executions(&self, identity_hash: &str) -> Result<Vec<JobExecution>, RepositoryError>;

    /// Inserta la ejecución si ninguna otra de la misma identidad está
    /// COMPLETED (`DuplicateRun`) o en curso (`AlreadyRunning`).
    fn create_job_execution(&self, execution: &JobExecution) -> Result<(), RepositoryError>;

    fn update_job_execution(&self, execution: &JobExecution) -> Result<(), RepositoryError>;

    fn get_job_execution(&self, id: Uuid) -> Result<Option<JobExecution>, RepositoryError>;

    /// Ejecuciones ordenadas de la más antigua a la más reciente, opcionalmente
    /// filtradas por job.
    fn list_job_executions(&self, job_name: Option<&str>) -> Result<Vec<JobExecution>, RepositoryError>;

    /// Upsert por `id`.
    fn save_step_execution(&self, step: &StepExecution) -> Result<(), RepositoryError>;

    /// Ejecuciones de step de un job, en orden de inicio.
    fn step_executions(&self, job_execution_id: Uuid) -> Result<Vec<StepExecution>, RepositoryError>;

    /// Última ejecución de `step_name` dentro de una instancia.
    fn last_step_execution(&self, identity_hash: &str, step_name: &str) -> Result<Option<StepExecution>, RepositoryError>;

    fn append_event(&self, job_execution_id: Uuid, kind: BatchEventKind, ts: DateTime<Utc>) -> Result<BatchEvent, RepositoryError>;

    fn list_events(&self, job_execution_id: Uuid) -> Result<Vec<BatchEvent>, RepositoryError>;
}

/// Regla de duplicado/ejecución en curso sobre las ejecuciones existentes de
/// una instancia. Compartida por las implementaciones.
pub fn check_instance(job_name: &str, identity_hash: &str, existing: &[JobExecution]) -> Result<(), RepositoryError> {
    if existing.iter().any(|e| e.status == BatchStatus::Completed) {
        return Err(RepositoryError::DuplicateRun { job_name: job_name.to_string(),
                                                   identity_hash: identity_hash.to_string() });
    }
    if let Some(running) = existing.iter().find(|e| e.status.is_running()) {
        return Err(RepositoryError::AlreadyRunning { job_name: job_name.to_string(),
                                                     execution_id: running.id.to_string() });
    }
    Ok(())
}
