use std::sync::Arc;

use batch_adapters::jobs::{data_processing_job_with_api, DATA_PROCESSING_JOB, JOB_PARAMETER_FLOW_JOB, SIMPLE_JOB, STEP_NEXT_JOB};
use batch_adapters::tasklets::{INIT_COUNT_KEY, PROMOTED_KEY, PROMOTED_VALUE, USER_NAME_KEY};
use batch_adapters::{register_demo_jobs, DemoResources, ExternalApi, JobSettings};
use batch_core::{BatchError, BatchStatus, ExecutionRepository, InMemoryExecutionRepository, JobExecution, JobLauncher, ParameterSet, StepFault};

fn launcher(res: &DemoResources) -> (JobLauncher, Arc<InMemoryExecutionRepository>) {
    let repo = Arc::new(InMemoryExecutionRepository::new());
    let mut launcher = JobLauncher::new(repo.clone());
    register_demo_jobs(&mut launcher, res, &JobSettings::instant()).expect("register");
    (launcher, repo)
}

fn step_names(repo: &InMemoryExecutionRepository, exec: &JobExecution) -> Vec<String> {
    repo.step_executions(exec.id)
        .expect("steps")
        .into_iter()
        .map(|s| s.step_name)
        .collect()
}

#[test]
fn data_processing_job_processes_every_seeded_row() {
    let res = DemoResources::new();
    let (launcher, repo) = launcher(&res);

    let exec = launcher.run(DATA_PROCESSING_JOB, ParameterSet::empty()).expect("run");
    assert_eq!(exec.status, BatchStatus::Completed, "failures: {:?}", exec.failures);
    assert_eq!(exec.parameters.get_long("run.id"), Some(1));
    assert_eq!(res.input.count(), 100);
    assert_eq!(res.input.count_unprocessed(), 0);
    assert_eq!(res.output.len(), 100);
    assert!(res.output.rows().iter().all(|o| o.api_response.starts_with("Processed: ")));

    assert_eq!(exec.context.get_str(PROMOTED_KEY), Some(PROMOTED_VALUE));
    assert_eq!(exec.context.get_i64(INIT_COUNT_KEY), Some(100));

    assert_eq!(step_names(&repo, &exec),
               vec!["contextPromotionStep", "continuableStep", "callableTaskletStep", "dataInitializationStep", "dataProcessingStep"]);
    let steps = repo.step_executions(exec.id).expect("steps");
    let continuable = &steps[1];
    assert_eq!(continuable.commit_count, 3);
    let processing = &steps[4];
    assert_eq!((processing.read_count, processing.write_count, processing.commit_count), (100, 100, 10));
}

#[test]
fn data_processing_job_run_id_increments_and_skips_seeding() {
    let res = DemoResources::new();
    let (launcher, _repo) = launcher(&res);

    let first = launcher.run(DATA_PROCESSING_JOB, ParameterSet::empty()).expect("first");
    let second = launcher.run(DATA_PROCESSING_JOB, ParameterSet::empty()).expect("second");
    assert_eq!(first.parameters.get_long("run.id"), Some(1));
    assert_eq!(second.parameters.get_long("run.id"), Some(2));
    assert_ne!(first.identity_hash, second.identity_hash);
    assert_eq!(second.status, BatchStatus::Completed);
    assert_eq!(res.input.count(), 100);
    assert_eq!(res.output.len(), 100);
}

struct DownApi;

impl ExternalApi for DownApi {
    fn call(&self, _input: &str) -> Result<String, StepFault> {
        Err(StepFault::process("connection refused"))
    }
}

#[test]
fn processing_fault_routes_to_fail_step() {
    let res = DemoResources::new();
    let repo = Arc::new(InMemoryExecutionRepository::new());
    let job = data_processing_job_with_api(&res, &JobSettings::instant(), Arc::new(DownApi)).expect("job");
    let launcher = JobLauncher::new(repo.clone()).with_job(job);

    let exec = launcher.run(DATA_PROCESSING_JOB, ParameterSet::empty()).expect("run");
    assert_eq!(exec.status, BatchStatus::Failed);
    let names = step_names(&repo, &exec);
    assert_eq!(names.last().map(String::as_str), Some("failStep"));
    let steps = repo.step_executions(exec.id).expect("steps");
    let processing = steps.iter().find(|s| s.step_name == "dataProcessingStep").expect("processing step");
    assert_eq!(processing.status, BatchStatus::Failed);
    assert_eq!(processing.write_count, 0);
    assert!(res.output.is_empty());
    assert!(exec.failures.iter().any(|f| f.contains("connection refused")), "{:?}", exec.failures);
}

fn params(pairs: &[(&str, &str)]) -> ParameterSet {
    pairs.iter()
         .fold(ParameterSet::builder(), |b, (k, v)| b.add_string(*k, *v))
         .build()
}

#[test]
fn job_parameter_flow_rejects_incomplete_delta() {
    let res = DemoResources::new();
    let (launcher, repo) = launcher(&res);

    let err = launcher.run(JOB_PARAMETER_FLOW_JOB, params(&[("name", "kim"), ("mode", "DELTA")]))
                      .expect_err("missing dates");
    assert!(matches!(err, BatchError::InvalidParameters(_)), "{err}");
    assert!(repo.last_job_execution(JOB_PARAMETER_FLOW_JOB).expect("last").is_none());
}

#[test]
fn job_parameter_flow_ends_failed_with_updated_user_name() {
    let res = DemoResources::new();
    let (launcher, _repo) = launcher(&res);

    let exec = launcher.run(JOB_PARAMETER_FLOW_JOB, params(&[("name", "kim"), ("mode", "FULL")]))
                       .expect("run");
    assert_eq!(exec.status, BatchStatus::Failed);
    assert_eq!(exec.exit_status.exit_code, "FAILED");
    assert_eq!(exec.context.get_str(USER_NAME_KEY), Some("kim_updated"));
}

#[test]
fn step_next_job_routes_failed_exit_to_fail_step() {
    let res = DemoResources::new();
    let (launcher, repo) = launcher(&res);

    let exec = launcher.run(STEP_NEXT_JOB, params(&[("name", "lee")])).expect("run");
    assert_eq!(step_names(&repo, &exec), vec!["step1", "jobFailStep"]);
    assert_eq!(exec.status, BatchStatus::Completed);
}

#[test]
fn simple_job_completes_once_per_identity() {
    let res = DemoResources::new();
    let (launcher, _repo) = launcher(&res);

    let exec = launcher.run(SIMPLE_JOB, params(&[("timestamp", "1")])).expect("run");
    assert_eq!(exec.status, BatchStatus::Completed);
    let again = launcher.run(SIMPLE_JOB, params(&[("timestamp", "1")]));
    assert!(matches!(again, Err(BatchError::DuplicateRun { .. })));
}
