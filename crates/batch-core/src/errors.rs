//! Errores del core.
//!
//! - `BatchError`: rechazos síncronos del punto de entrada (el job nunca
//!   arranca o no puede definirse).
//! - `StepFault`: fallo de un colaborador dentro de un step en ejecución. Se
//!   captura en el registro de ejecución, nunca escapa del hilo del job.
//! - `RepositoryError`: contrato de almacenamiento.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::InvalidParameters;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum BatchError {
    #[error(transparent)]
    InvalidParameters(#[from] InvalidParameters),
    #[error("job instance already completed: job={job_name} identity={identity_hash}")]
    DuplicateRun { job_name: String, identity_hash: String },
    #[error("job instance is already running: job={job_name} execution={execution_id}")]
    AlreadyRunning { job_name: String, execution_id: String },
    #[error("unknown job: {0}")] UnknownJob(String),
    #[error("invalid flow definition: {0}")] FlowDefinition(String),
    #[error("repository: {0}")] Repository(String),
    #[error("cannot launch job thread: {0}")] Launch(String),
}

impl From<RepositoryError> for BatchError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::DuplicateRun { job_name, identity_hash } => BatchError::DuplicateRun { job_name, identity_hash },
            RepositoryError::AlreadyRunning { job_name, execution_id } => BatchError::AlreadyRunning { job_name, execution_id },
            other => BatchError::Repository(other.to_string()),
        }
    }
}

/// Origen de un fallo dentro de un step.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FaultKind {
    Read,
    Process,
    Write,
    Tasklet,
    /// El tasklet pidió re-ejecución más veces que el límite configurado.
    RepeatLimit,
    Configuration,
    Repository,
    Panic,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Read => "read",
            FaultKind::Process => "process",
            FaultKind::Write => "write",
            FaultKind::Tasklet => "tasklet",
            FaultKind::RepeatLimit => "repeat-limit",
            FaultKind::Configuration => "configuration",
            FaultKind::Repository => "repository",
            FaultKind::Panic => "panic",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[error("{} fault: {message}", kind.as_str())]
pub struct StepFault {
    pub kind: FaultKind,
    pub message: String,
}

impl StepFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self { kind,
               message: message.into() }
    }
    pub fn read(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Read, message)
    }
    pub fn process(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Process, message)
    }
    pub fn write(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Write, message)
    }
    pub fn tasklet(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Tasklet, message)
    }
}

impl From<RepositoryError> for StepFault {
    fn from(e: RepositoryError) -> Self {
        StepFault::new(FaultKind::Repository, e.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum RepositoryError {
    #[error("job instance already completed: job={job_name} identity={identity_hash}")]
    DuplicateRun { job_name: String, identity_hash: String },
    #[error("job instance is already running: job={job_name} execution={execution_id}")]
    AlreadyRunning { job_name: String, execution_id: String },
    #[error("not found: {0}")] NotFound(String),
    #[error("serialization: {0}")] Serialization(String),
    #[error("storage: {0}")] Storage(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_conflicts_map_to_launch_errors() {
        let e: BatchError = RepositoryError::DuplicateRun { job_name: "j".into(),
                                                            identity_hash: "h".into() }.into();
        assert_eq!(e,
                   BatchError::DuplicateRun { job_name: "j".into(),
                                              identity_hash: "h".into() });
        let e: BatchError = RepositoryError::Storage("disk".into()).into();
        assert!(matches!(e, BatchError::Repository(msg) if msg.contains("disk")));
    }

    #[test]
    fn fault_display_names_kind() {
        assert_eq!(StepFault::write("boom").to_string(), "write fault: boom");
    }
}
