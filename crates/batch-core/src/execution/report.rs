//! Superficie de observabilidad: reportes serializables por job/step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{JobExecution, StepExecution};
use super::status::BatchStatus;

/// Escrituras por segundo; 0 si no transcurrió tiempo.
pub fn throughput(write_count: u64, elapsed_ms: i64) -> f64 {
    if elapsed_ms <= 0 {
        0.0
    } else {
        write_count as f64 * 1000.0 / elapsed_ms as f64
    }
}

/// `"2m 5s 0ms"`, `"3s 500ms"` o `"99ms"`.
pub fn format_duration(ms: i64) -> String {
    let ms = ms.max(0);
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    if minutes > 0 {
        format!("{minutes}m {seconds}s {millis}ms")
    } else if seconds > 0 {
        format!("{seconds}s {millis}ms")
    } else {
        format!("{millis}ms")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step_name: String,
    pub status: BatchStatus,
    pub exit_code: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub elapsed_ms: i64,
    pub read_count: u64,
    pub write_count: u64,
    pub skip_count: u64,
    pub commit_count: u64,
    pub rollback_count: u64,
    pub throughput: f64,
}

impl From<&StepExecution> for StepReport {
    fn from(s: &StepExecution) -> Self {
        let elapsed_ms = s.elapsed_ms();
        Self { step_name: s.step_name.clone(),
               status: s.status,
               exit_code: s.exit_status.exit_code.clone(),
               start_time: s.start_time,
               end_time: s.end_time,
               elapsed_ms,
               read_count: s.read_count,
               write_count: s.write_count,
               skip_count: s.skip_count,
               commit_count: s.commit_count,
               rollback_count: s.rollback_count,
               throughput: throughput(s.write_count, elapsed_ms) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub execution_id: Uuid,
    pub job_name: String,
    pub status: BatchStatus,
    pub exit_code: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub elapsed_ms: i64,
    pub steps: Vec<StepReport>,
}

impl JobReport {
    pub fn new(job: &JobExecution, steps: &[StepExecution]) -> Self {
        Self { execution_id: job.id,
               job_name: job.job_name.clone(),
               status: job.status,
               exit_code: job.exit_status.exit_code.clone(),
               start_time: job.start_time,
               end_time: job.end_time,
               elapsed_ms: job.elapsed_ms(),
               steps: steps.iter().map(StepReport::from).collect() }
    }

    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(125_000), "2m 5s 0ms");
        assert_eq!(format_duration(3_500), "3s 500ms");
        assert_eq!(format_duration(99), "99ms");
        assert_eq!(format_duration(-5), "0ms");
    }

    #[test]
    fn throughput_is_zero_without_elapsed_time() {
        assert_eq!(throughput(10, 0), 0.0);
        assert_eq!(throughput(10, 2000), 5.0);
    }
}
