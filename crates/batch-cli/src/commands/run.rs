use batch_core::{parse_cli_params, BatchStatus, JobReport};
use log::info;

use super::{show, CliError, Session};

/// `batch run <job> [params...]`: lanza el job en su hilo, espera el estado
/// terminal e imprime el informe.
pub fn execute(session: &Session, job: &str, raw_params: &[String], json: bool) -> Result<(), CliError> {
    let params = parse_cli_params(raw_params)?;
    let handle = session.launcher.start(job, params)?;
    info!("job '{job}' launched: execution={}", handle.execution_id());
    let execution = handle.wait()?;
    let steps = session.repository.step_executions(execution.id)?;
    let report = JobReport::new(&execution, &steps);
    show::print_report(&report, json)?;
    for failure in &execution.failures {
        eprintln!("  failure: {failure}");
    }
    match execution.status {
        BatchStatus::Completed => Ok(()),
        other => Err(CliError::Unsuccessful(other.to_string())),
    }
}
