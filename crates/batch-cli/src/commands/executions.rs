use super::{CliError, Session};

pub fn execute(session: &Session, job: Option<&str>) -> Result<(), CliError> {
    let executions = session.repository.list_job_executions(job)?;
    if executions.is_empty() {
        println!("no executions");
        return Ok(());
    }
    for e in executions {
        let started = e.start_time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string());
        println!("{}  {:<24} {:<9} exit={:<10} started={started}",
                 e.id,
                 e.job_name,
                 e.status.as_str(),
                 e.exit_status.exit_code);
    }
    Ok(())
}
