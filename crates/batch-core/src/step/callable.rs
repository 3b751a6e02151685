//! Tasklet cuyo cuerpo se delega a un pool de rayon.
//!
//! El hilo del step queda bloqueado en `ThreadPool::install` hasta observar el
//! resultado: es un relevo bloqueante, no ejecución paralela de steps.

use std::sync::Arc;

use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{RepeatStatus, StepScope, Tasklet};
use crate::errors::{FaultKind, StepFault};

type CallableBody = dyn Fn() -> Result<RepeatStatus, StepFault> + Send + Sync;

#[derive(Clone)]
pub struct CallableTasklet {
    pool: Arc<ThreadPool>,
    body: Arc<CallableBody>,
}

impl CallableTasklet {
    /// Pool dedicado de un hilo.
    pub fn new<F>(body: F) -> Result<Self, StepFault>
        where F: Fn() -> Result<RepeatStatus, StepFault> + Send + Sync + 'static
    {
        let pool = ThreadPoolBuilder::new().num_threads(1)
                                           .thread_name(|i| format!("callable-tasklet-{i}"))
                                           .build()
                                           .map_err(|e| StepFault::new(FaultKind::Configuration, format!("callable pool: {e}")))?;
        Ok(Self::with_pool(Arc::new(pool), body))
    }

    pub fn with_pool<F>(pool: Arc<ThreadPool>, body: F) -> Self
        where F: Fn() -> Result<RepeatStatus, StepFault> + Send + Sync + 'static
    {
        Self { pool,
               body: Arc::new(body) }
    }
}

impl Tasklet for CallableTasklet {
    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault> {
        debug!("step '{}': delegating callable to worker pool", scope.step_name());
        let body = self.body.clone();
        self.pool.install(move || body())
    }
}
