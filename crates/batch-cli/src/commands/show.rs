use batch_core::execution::format_duration;
use batch_core::JobReport;
use uuid::Uuid;

use super::{CliError, Session};

pub fn execute(session: &Session, id: Uuid, events: bool, json: bool) -> Result<(), CliError> {
    let execution = session.repository
                           .get_job_execution(id)?
                           .ok_or_else(|| CliError::NotFound(id.to_string()))?;
    let steps = session.repository.step_executions(id)?;
    print_report(&JobReport::new(&execution, &steps), json)?;
    if !execution.parameters.is_empty() {
        println!("parameters: {}", serde_json::to_string(&execution.parameters)?);
    }
    if events {
        for ev in session.repository.list_events(id)? {
            if json {
                println!("{}", serde_json::to_string(&ev)?);
            } else {
                println!("  #{:<3} [{}] {}  {:?}", ev.seq, ev.kind.code(), ev.ts.to_rfc3339(), ev.kind);
            }
        }
    }
    Ok(())
}

pub fn print_report(report: &JobReport, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("{} {} status={} exit={} duration={}",
             report.execution_id,
             report.job_name,
             report.status,
             report.exit_code,
             format_duration(report.elapsed_ms));
    for s in &report.steps {
        println!("  {:<24} {:<9} exit={:<10} read={} write={} skip={} commit={} rollback={} {:.2}/sec",
                 s.step_name,
                 s.status.as_str(),
                 s.exit_code,
                 s.read_count,
                 s.write_count,
                 s.skip_count,
                 s.commit_count,
                 s.rollback_count,
                 s.throughput);
    }
    Ok(())
}
