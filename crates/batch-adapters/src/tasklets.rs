//! Tasklets de demostración.

use std::time::Duration;

use batch_core::{CallableTasklet, ExitStatus, ParameterSet, RepeatStatus, StepFault, StepScope, Tasklet};
use chrono::Utc;
use log::{error, info};

use crate::table::{InputTable, NewInput};

pub const PROMOTED_KEY: &str = "promotedKey";
pub const PROMOTED_VALUE: &str = "value-from-step1";
pub const INIT_COUNT_KEY: &str = "initCount";
pub const USER_NAME_KEY: &str = "user.name";

/// Siembra `total` filas de prueba si la tabla de entrada está vacía.
#[derive(Debug, Clone)]
pub struct DataInitializationTasklet {
    table: InputTable,
    total: usize,
    batch_size: usize,
}

impl DataInitializationTasklet {
    pub fn new(table: InputTable, total: usize) -> Self {
        Self { table,
               total,
               batch_size: 10 }
    }
}

impl Tasklet for DataInitializationTasklet {
    fn execute(&mut self, _scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault> {
        let existing = self.table.count();
        if existing > 0 {
            info!("input table already has {existing} rows; skipping creation");
            return Ok(RepeatStatus::Finished);
        }
        info!("input table is empty; creating {} test rows", self.total);
        let stamp = Utc::now().timestamp_millis();
        let mut batch = Vec::with_capacity(self.batch_size);
        for i in 1..=self.total {
            batch.push(NewInput { name: format!("TestData-{i}"),
                                  data: format!("Data-{i}-{stamp}"),
                                  status: (i % 10) as i32 });
            if batch.len() >= self.batch_size {
                self.table.insert_all(batch.drain(..));
                info!("created {i} / {} test rows", self.total);
            }
        }
        if !batch.is_empty() {
            self.table.insert_all(batch.drain(..));
            info!("created {0} / {0} test rows", self.total);
        }
        Ok(RepeatStatus::Finished)
    }
}

/// Paso de manejo de fallo: marca la salida FAILED y además devuelve un
/// fault, de modo que el step (y con él el job) termina FAILED.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailStepTasklet;

impl Tasklet for FailStepTasklet {
    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault> {
        error!("job '{}' reached step '{}': a previous step failed", scope.job_name(), scope.step_name());
        scope.set_exit_status(ExitStatus::failed());
        Err(StepFault::tasklet("Job execution failed. Previous step encountered an error."))
    }
}

/// Escribe en el contexto del step las claves que luego se promueven.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextPromotionTasklet;

impl Tasklet for ContextPromotionTasklet {
    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault> {
        let ctx = scope.step_context_mut();
        ctx.put(PROMOTED_KEY, PROMOTED_VALUE);
        ctx.put(INIT_COUNT_KEY, 100);
        info!("step context: stored {PROMOTED_KEY} and {INIT_COUNT_KEY} for promotion");
        Ok(RepeatStatus::Finished)
    }
}

/// Pide re-ejecución hasta completar `max` invocaciones.
#[derive(Debug, Clone)]
pub struct ContinuableTasklet {
    count: usize,
    max: usize,
}

impl ContinuableTasklet {
    pub const MAX_COUNT: usize = 3;

    pub fn new(max: usize) -> Self {
        Self { count: 0, max }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl Default for ContinuableTasklet {
    fn default() -> Self {
        Self::new(Self::MAX_COUNT)
    }
}

impl Tasklet for ContinuableTasklet {
    fn execute(&mut self, _scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault> {
        self.count += 1;
        info!("continuable tasklet run {}/{}", self.count, self.max);
        if self.count >= self.max {
            Ok(RepeatStatus::Finished)
        } else {
            Ok(RepeatStatus::Continuable)
        }
    }
}

/// Cuerpo que corre en un hilo aparte durante `work` y termina.
pub fn sleeping_callable(work: Duration) -> Result<CallableTasklet, StepFault> {
    CallableTasklet::new(move || {
        info!("callable tasklet running on {:?}", std::thread::current().name());
        if !work.is_zero() {
            std::thread::sleep(work);
        }
        Ok(RepeatStatus::Finished)
    })
}

/// Escribe `user.name` en el contexto del job (dos veces, la segunda con
/// sufijo `_updated`) y termina con salida FAILED sin fault.
#[derive(Debug, Clone)]
pub struct JobParameterFlowTasklet {
    name: String,
}

impl JobParameterFlowTasklet {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Resuelve `name` de los parámetros al crear el step.
    pub fn from_params(params: &ParameterSet) -> Self {
        Self::new(params.get_string("name").unwrap_or_default())
    }
}

impl Tasklet for JobParameterFlowTasklet {
    fn execute(&mut self, scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault> {
        info!("job '{}' step '{}' running with name={}", scope.job_name(), scope.step_name(), self.name);
        scope.job_context_mut().put(USER_NAME_KEY, self.name.as_str());
        info!("job context holds {} key(s)", scope.job_context_view().len());
        scope.job_context_mut().put(USER_NAME_KEY, format!("{}_updated", self.name));
        scope.set_exit_status(ExitStatus::failed());
        Ok(RepeatStatus::Finished)
    }
}

/// Tasklet que sólo deja constancia en el log.
#[derive(Debug, Clone)]
pub struct LogTasklet {
    message: String,
}

impl LogTasklet {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl Tasklet for LogTasklet {
    fn execute(&mut self, _scope: &mut StepScope<'_>) -> Result<RepeatStatus, StepFault> {
        info!("{}", self.message);
        Ok(RepeatStatus::Finished)
    }
}
