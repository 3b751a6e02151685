use log::debug;

use super::{Step, StepKind, StepScope};
use crate::constants::DEFAULT_MAX_ITERATIONS;
use crate::errors::{FaultKind, StepFault};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatStatus {
    /// Re-invocar en el mismo contexto de step.
    Continuable,
    Finished,
}

pub trait Tasklet: Send {
    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault>;
}

/// Tasklet a partir de un closure.
pub struct FnTasklet<F>(F);

impl<F> FnTasklet<F> where F: FnMut(&mut StepScope<'_>) -> Result<RepeatStatus, StepFault> + Send
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Tasklet for FnTasklet<F> where F: FnMut(&mut StepScope<'_>) -> Result<RepeatStatus, StepFault> + Send
{
    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault> {
        (self.0)(scope)
    }
}

pub struct TaskletStep {
    tasklet: Box<dyn Tasklet>,
    max_iterations: usize,
}

impl TaskletStep {
    pub fn new(tasklet: impl Tasklet + 'static) -> Self {
        Self { tasklet: Box::new(tasklet),
               max_iterations: DEFAULT_MAX_ITERATIONS }
    }

    pub fn from_fn<F>(f: F) -> Self
        where F: FnMut(&mut StepScope<'_>) -> Result<RepeatStatus, StepFault> + Send + 'static
    {
        Self::new(FnTasklet::new(f))
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }
}

impl Step for TaskletStep {
    fn kind(&self) -> StepKind {
        StepKind::Tasklet
    }

    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<(), StepFault> {
        let mut iteration = 0usize;
        loop {
            if iteration > 0 && scope.stop_requested() {
                debug!("step '{}': stop requested after {iteration} iterations", scope.step_name());
                scope.mark_stopped();
                return Ok(());
            }
            if iteration >= self.max_iterations {
                return Err(StepFault::new(FaultKind::RepeatLimit,
                                          format!("tasklet still continuable after {} iterations", self.max_iterations)));
            }
            let status = self.tasklet.execute(scope)?;
            iteration += 1;
            scope.record_iteration()?;
            if status == RepeatStatus::Finished {
                return Ok(());
            }
        }
    }
}
