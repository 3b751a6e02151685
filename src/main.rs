use std::process::ExitCode;

use batch_adapters::jobs::DATA_PROCESSING_JOB;
use batch_core::{BatchError, BatchStatus, JobReport, ParameterSet};
use batch_persistence::DbConfig;
use batchflow::{App, AppError, CONFIG};
use chrono::Utc;
use log::{error, info};

fn run() -> Result<BatchStatus, AppError> {
    let app = App::new(&DbConfig::from_env(), &CONFIG)?;
    let params = ParameterSet::builder().add_long("timestamp", Utc::now().timestamp_millis()).build();
    let handle = app.launcher.start(DATA_PROCESSING_JOB, params)?;
    info!("execution {} started", handle.execution_id());
    let execution = handle.wait()?;
    let steps = app.repository.step_executions(execution.id).map_err(BatchError::from)?;
    let report = JobReport::new(&execution, &steps);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("cannot render report: {e}"),
    }
    println!("output rows: {}", app.resources.output.len());
    Ok(execution.status)
}

fn main() -> ExitCode {
    batchflow::logging::init("info");
    batch_persistence::init_dotenv();

    match run() {
        Ok(BatchStatus::Completed) => ExitCode::SUCCESS,
        Ok(status) => {
            error!("{DATA_PROCESSING_JOB} finished with status {status}");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(5)
        }
    }
}
