use std::sync::Arc;

use batch_adapters::{register_demo_jobs, DemoResources};
use batch_core::{BatchError, ExecutionRepository, JobLauncher};
use batch_persistence::{build_pool, DbConfig, PersistenceError, SqliteExecutionRepository};
use log::info;
use thiserror::Error;

use crate::config::BatchConfig;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database: {0}")]
    Database(#[from] PersistenceError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Launcher listo para usar: jobs de demostración registrados sobre un
/// repositorio de ejecuciones SQLite y tablas de entrada/salida compartidas.
pub struct App {
    pub launcher: JobLauncher,
    pub repository: Arc<dyn ExecutionRepository>,
    pub resources: DemoResources,
}

impl App {
    pub fn new(db: &DbConfig, cfg: &BatchConfig) -> Result<Self, AppError> {
        let pool = build_pool(db)?;
        Self::with_repository(Arc::new(SqliteExecutionRepository::from_pool(pool)), cfg)
    }

    pub fn with_repository(repository: Arc<dyn ExecutionRepository>, cfg: &BatchConfig) -> Result<Self, AppError> {
        let resources = DemoResources::new();
        let mut launcher = JobLauncher::new(repository.clone());
        register_demo_jobs(&mut launcher, &resources, &cfg.job_settings())?;
        info!("registered jobs: {:?}", launcher.registry().names());
        Ok(Self { launcher,
                  repository,
                  resources })
    }
}
