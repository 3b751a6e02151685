use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{BatchStatus, ExitStatus};
use crate::context::ExecutionContext;
use crate::params::ParameterSet;

/// Registro de una ejecución de job. Lo muta sólo el orquestador que la
/// posee; inmutable una vez en estado terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobExecution {
    pub id: Uuid,
    pub job_name: String,
    pub identity_hash: String,
    pub parameters: ParameterSet,
    pub status: BatchStatus,
    pub exit_status: ExitStatus,
    pub create_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub context: ExecutionContext,
    pub failures: Vec<String>,
}

impl JobExecution {
    pub fn new(job_name: impl Into<String>, identity_hash: impl Into<String>, parameters: ParameterSet, now: DateTime<Utc>) -> Self {
        Self { id: Uuid::new_v4(),
               job_name: job_name.into(),
               identity_hash: identity_hash.into(),
               parameters,
               status: BatchStatus::Starting,
               exit_status: ExitStatus::unknown(),
               create_time: now,
               start_time: None,
               end_time: None,
               context: ExecutionContext::new(),
               failures: Vec::new() }
    }

    pub fn elapsed_ms(&self) -> i64 {
        elapsed(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExecution {
    pub id: Uuid,
    pub job_execution_id: Uuid,
    pub step_name: String,
    pub status: BatchStatus,
    pub exit_status: ExitStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub read_count: u64,
    pub write_count: u64,
    /// Items descartados por el processor.
    pub skip_count: u64,
    pub commit_count: u64,
    pub rollback_count: u64,
    pub context: ExecutionContext,
    pub failures: Vec<String>,
}

impl StepExecution {
    pub fn new(job_execution_id: Uuid, step_name: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(),
               job_execution_id,
               step_name: step_name.into(),
               status: BatchStatus::Starting,
               exit_status: ExitStatus::executing(),
               start_time: None,
               end_time: None,
               read_count: 0,
               write_count: 0,
               skip_count: 0,
               commit_count: 0,
               rollback_count: 0,
               context: ExecutionContext::new(),
               failures: Vec::new() }
    }

    pub fn elapsed_ms(&self) -> i64 {
        elapsed(self.start_time, self.end_time)
    }
}

fn elapsed(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> i64 {
    match (start, end) {
        (Some(s), Some(e)) => (e - s).num_milliseconds().max(0),
        _ => 0,
    }
}
