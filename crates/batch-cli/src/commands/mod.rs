//! Subcomandos de la CLI y estado compartido entre ellos.

pub mod executions;
pub mod jobs;
pub mod run;
pub mod show;

use std::sync::Arc;

use batch_adapters::{register_demo_jobs, DemoResources, JobSettings};
use batch_core::params::ParamParseError;
use batch_core::{BatchError, ExecutionRepository, JobLauncher, RepositoryError};
use batch_persistence::{build_pool, init_dotenv, DbConfig, PersistenceError, SqliteExecutionRepository};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid parameter: {0}")]
    Params(#[from] ParamParseError),
    #[error(transparent)]
    Launch(#[from] BatchError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("database: {0}")]
    Database(#[from] PersistenceError),
    #[error("execution not found: {0}")]
    NotFound(String),
    #[error("job finished with status {0}")]
    Unsuccessful(String),
    #[error("output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// 1 = job terminado sin éxito, 4 = petición rechazada, 5 = backend.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Unsuccessful(_) => 1,
            CliError::Params(_) | CliError::NotFound(_) => 4,
            CliError::Launch(BatchError::Repository(_)) | CliError::Launch(BatchError::Launch(_)) => 5,
            CliError::Launch(_) => 4,
            CliError::Repository(_) | CliError::Database(_) | CliError::Output(_) => 5,
        }
    }
}

/// Repositorio SQLite + launcher con los jobs de demostración registrados.
pub struct Session {
    pub repository: Arc<dyn ExecutionRepository>,
    pub launcher: JobLauncher,
}

impl Session {
    pub fn open(database: Option<&str>, settings: &JobSettings) -> Result<Self, CliError> {
        init_dotenv();
        let mut cfg = DbConfig::from_env();
        if let Some(path) = database {
            cfg.url = path.to_string();
        }
        let pool = build_pool(&cfg)?;
        let repository: Arc<dyn ExecutionRepository> = Arc::new(SqliteExecutionRepository::from_pool(pool));
        let mut launcher = JobLauncher::new(repository.clone());
        register_demo_jobs(&mut launcher, &DemoResources::new(), settings)?;
        Ok(Self { repository, launcher })
    }
}
