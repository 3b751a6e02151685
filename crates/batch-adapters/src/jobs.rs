//! Definiciones de los jobs de demostración.
//!
//! Cada función devuelve un `Job` ya validado; `register_demo_jobs` los
//! registra todos en un launcher compartiendo las mismas tablas.

use std::sync::Arc;
use std::time::Duration;

use batch_core::{BatchError, ChunkStep, CompositePolicy, CountPolicy, FlowBuilder, Job, JobBuilder, JobLauncher, PerformanceListener, PromotionListener, RunIdIncrementer, TaskletStep, TimeoutPolicy};

use crate::entities::{BatchInput, BatchOutput};
use crate::processor::{ApiCallProcessor, ExternalApi, SimulatedApi};
use crate::reader::TableReader;
use crate::table::{InputTable, OutputTable};
use crate::tasklets::{sleeping_callable, ContextPromotionTasklet, ContinuableTasklet, DataInitializationTasklet, FailStepTasklet, JobParameterFlowTasklet, LogTasklet, INIT_COUNT_KEY, PROMOTED_KEY};
use crate::validators::{job_parameter_validator, run_id_validator};
use crate::writer::TableWriter;

pub const DATA_PROCESSING_JOB: &str = "dataProcessingJob";
pub const JOB_PARAMETER_FLOW_JOB: &str = "jobParameterFlowJob";
pub const STEP_NEXT_JOB: &str = "stepNextJob";
pub const SIMPLE_JOB: &str = "simpleJob";

/// Ajustes de los jobs de demostración.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    pub chunk_size: usize,
    pub chunk_timeout_ms: u64,
    pub input_rows: usize,
    pub api_latency_ms: u64,
    pub callable_latency_ms: u64,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self { chunk_size: 10,
               chunk_timeout_ms: 3000,
               input_rows: 100,
               api_latency_ms: 150,
               callable_latency_ms: 500 }
    }
}

impl JobSettings {
    /// Sin latencias simuladas (tests).
    pub fn instant() -> Self {
        Self { api_latency_ms: 0,
               callable_latency_ms: 0,
               ..Self::default() }
    }
}

/// Tablas compartidas por todas las ejecuciones.
#[derive(Debug, Clone, Default)]
pub struct DemoResources {
    pub input: InputTable,
    pub output: OutputTable,
}

impl DemoResources {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn data_processing_job(res: &DemoResources, settings: &JobSettings) -> Result<Job, BatchError> {
    data_processing_job_with_api(res, settings, Arc::new(SimulatedApi::from_millis(settings.api_latency_ms)))
}

/// Igual que `data_processing_job` pero con una API externa arbitraria.
pub fn data_processing_job_with_api(res: &DemoResources,
                                    settings: &JobSettings,
                                    api: Arc<dyn ExternalApi>)
                                    -> Result<Job, BatchError> {
    let init_table = res.input.clone();
    let input_rows = settings.input_rows;
    let callable_latency = Duration::from_millis(settings.callable_latency_ms);
    let (read_table, inputs, outputs) = (res.input.clone(), res.input.clone(), res.output.clone());
    let (chunk_size, chunk_timeout_ms) = (settings.chunk_size, settings.chunk_timeout_ms);

    JobBuilder::new(DATA_PROCESSING_JOB).step("contextPromotionStep", |_p| Ok(TaskletStep::new(ContextPromotionTasklet)))
                                        .step_listener("contextPromotionStep", PromotionListener::new([PROMOTED_KEY, INIT_COUNT_KEY]))
                                        .step("continuableStep", |_p| Ok(TaskletStep::new(ContinuableTasklet::default())))
                                        .step("callableTaskletStep", move |_p| sleeping_callable(callable_latency).map(TaskletStep::new))
                                        .step("dataInitializationStep", move |_p| {
                                            Ok(TaskletStep::new(DataInitializationTasklet::new(init_table.clone(), input_rows)))
                                        })
                                        .step_listener("dataInitializationStep", PerformanceListener)
                                        .step("dataProcessingStep", move |_p| {
                                            ChunkStep::<BatchInput, BatchOutput>::builder()
                                                .reader(TableReader::with_page_size(read_table.clone(), chunk_size.max(1)))
                                                .processor(ApiCallProcessor::shared(api.clone()))
                                                .writer(TableWriter::new(inputs.clone(), outputs.clone()))
                                                .completion_policy(CompositePolicy::new(Vec::new()).with(CountPolicy::new(chunk_size))
                                                                                                   .with(TimeoutPolicy::from_millis(chunk_timeout_ms)))
                                                .build()
                                        })
                                        .step_listener("dataProcessingStep", PerformanceListener)
                                        .step("failStep", |_p| Ok(TaskletStep::new(FailStepTasklet)))
                                        .step_listener("failStep", PerformanceListener)
                                        .flow(FlowBuilder::start("contextPromotionStep").on("*")
                                                                                        .to("continuableStep")
                                                                                        .from("continuableStep")
                                                                                        .on("*")
                                                                                        .to("callableTaskletStep")
                                                                                        .from("callableTaskletStep")
                                                                                        .on("*")
                                                                                        .to("dataInitializationStep")
                                                                                        .from("dataInitializationStep")
                                                                                        .on("FAILED")
                                                                                        .to("failStep")
                                                                                        .from("dataInitializationStep")
                                                                                        .on("*")
                                                                                        .to("dataProcessingStep")
                                                                                        .from("dataProcessingStep")
                                                                                        .on("FAILED")
                                                                                        .to("failStep")
                                                                                        .from("dataProcessingStep")
                                                                                        .on("*")
                                                                                        .end())
                                        .validator(run_id_validator())
                                        .incrementer(RunIdIncrementer)
                                        .listener(PerformanceListener)
                                        .build()
}

/// Un único step que termina con salida FAILED sin fault.
pub fn job_parameter_flow_job() -> Result<Job, BatchError> {
    JobBuilder::new(JOB_PARAMETER_FLOW_JOB).step("jobParameterFlowStep", |p| Ok(TaskletStep::new(JobParameterFlowTasklet::from_params(p))))
                                           .validator(job_parameter_validator())
                                           .listener(PerformanceListener)
                                           .build()
}

pub fn step_next_job() -> Result<Job, BatchError> {
    JobBuilder::new(STEP_NEXT_JOB).step("step1", |p| Ok(TaskletStep::new(JobParameterFlowTasklet::from_params(p))))
                                  .step("jobFailStep", |_p| Ok(TaskletStep::new(LogTasklet::new(">> step1 failed; running jobFailStep"))))
                                  .step("finalStep", |_p| Ok(TaskletStep::new(LogTasklet::new(">> This is finalStep"))))
                                  .flow(FlowBuilder::start("step1").on("FAILED")
                                                                   .to("jobFailStep")
                                                                   .from("step1")
                                                                   .on("*")
                                                                   .to("finalStep"))
                                  .build()
}

pub fn simple_job() -> Result<Job, BatchError> {
    JobBuilder::new(SIMPLE_JOB).step("simpleStep1", |_p| Ok(TaskletStep::new(LogTasklet::new(">> This is Step 1"))))
                               .build()
}

/// Registra los cuatro jobs de demostración.
pub fn register_demo_jobs(launcher: &mut JobLauncher, res: &DemoResources, settings: &JobSettings) -> Result<(), BatchError> {
    launcher.register(data_processing_job(res, settings)?);
    launcher.register(job_parameter_flow_job()?);
    launcher.register(step_next_job()?);
    launcher.register(simple_job()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_processing_flow_has_all_steps() {
        let job = data_processing_job(&DemoResources::new(), &JobSettings::instant()).expect("job");
        assert_eq!(job.flow().start(), "contextPromotionStep");
        let mut names = job.flow().step_names();
        names.sort_unstable();
        assert_eq!(names,
                   vec!["callableTaskletStep",
                        "contextPromotionStep",
                        "continuableStep",
                        "dataInitializationStep",
                        "dataProcessingStep",
                        "failStep"]);
    }

    #[test]
    fn all_demo_jobs_register() {
        let mut launcher = JobLauncher::new(Arc::new(batch_core::InMemoryExecutionRepository::new()));
        register_demo_jobs(&mut launcher, &DemoResources::new(), &JobSettings::default()).expect("register");
        let mut names = launcher.registry().names();
        names.sort_unstable();
        assert_eq!(names, vec![DATA_PROCESSING_JOB, JOB_PARAMETER_FLOW_JOB, SIMPLE_JOB, STEP_NEXT_JOB]);
    }
}
