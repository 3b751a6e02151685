use log::info;

use super::{JobListener, StepListener};
use crate::context::ExecutionContext;
use crate::execution::{format_duration, throughput, ExitStatus, JobExecution, StepExecution};

/// Registra duración y throughput de jobs y steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerformanceListener;

impl PerformanceListener {
    pub fn job_line(job: &JobExecution) -> String {
        format!("[Job Performance] jobName={}, status={}, duration={}",
                job.job_name,
                job.status,
                format_duration(job.elapsed_ms()))
    }

    pub fn step_line(step: &StepExecution) -> String {
        let elapsed = step.elapsed_ms();
        format!("[Step Performance] stepName={}, duration={}, read={}, write={}, skip={}, commit={}, throughput={:.2}/sec",
                step.step_name,
                format_duration(elapsed),
                step.read_count,
                step.write_count,
                step.skip_count,
                step.commit_count,
                throughput(step.write_count, elapsed))
    }
}

impl JobListener for PerformanceListener {
    fn before_job(&self, job: &JobExecution) {
        info!("[Job Performance] jobName={} started", job.job_name);
    }

    fn after_job(&self, job: &JobExecution) {
        info!("{}", Self::job_line(job));
    }
}

impl StepListener for PerformanceListener {
    fn after_step(&self, step: &StepExecution, _job_context: &mut ExecutionContext) -> Option<ExitStatus> {
        info!("{}", Self::step_line(step));
        None
    }
}
