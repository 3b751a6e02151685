//! Filas Diesel y su mapeo al modelo de ejecución del core.
//!
//! Timestamps como RFC3339 en UTC con nanosegundos (el texto ordena igual que
//! el instante); parámetros, contexto y fallos como JSON.

use batch_core::{BatchStatus, ExecutionContext, ExitStatus, JobExecution, ParameterSet, StepExecution};
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::schema::{event_log, job_executions, step_executions};

pub(crate) fn fmt_ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
                                     .map_err(|e| PersistenceError::Serialization(format!("timestamp '{raw}': {e}")))
}

fn parse_opt_ts(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, PersistenceError> {
    raw.map(parse_ts).transpose()
}

fn parse_uuid(raw: &str) -> Result<Uuid, PersistenceError> {
    Uuid::parse_str(raw).map_err(|e| PersistenceError::Serialization(format!("uuid '{raw}': {e}")))
}

fn parse_status(raw: &str) -> Result<BatchStatus, PersistenceError> {
    raw.parse().map_err(PersistenceError::Serialization)
}

fn count_to_db(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn count_from_db(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

/// Fila leída de `job_executions` (orden de columnas del esquema).
#[derive(Queryable, Debug)]
pub struct JobExecutionRow {
    pub seq: i64,
    pub id: String,
    pub job_name: String,
    pub identity_hash: String,
    pub parameters_json: String,
    pub status: String,
    pub exit_code: String,
    pub exit_description: String,
    pub create_time: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub context_json: Option<String>,
    pub failures_json: String,
}

impl JobExecutionRow {
    pub fn into_domain(self) -> Result<JobExecution, PersistenceError> {
        let parameters: ParameterSet = serde_json::from_str(&self.parameters_json)?;
        let context = match self.context_json.as_deref() {
            Some(raw) => serde_json::from_str(raw)?,
            None => ExecutionContext::new(),
        };
        Ok(JobExecution { id: parse_uuid(&self.id)?,
                          job_name: self.job_name,
                          identity_hash: self.identity_hash,
                          parameters,
                          status: parse_status(&self.status)?,
                          exit_status: ExitStatus::new(self.exit_code).with_description(self.exit_description),
                          create_time: parse_ts(&self.create_time)?,
                          start_time: parse_opt_ts(self.start_time.as_deref())?,
                          end_time: parse_opt_ts(self.end_time.as_deref())?,
                          context,
                          failures: serde_json::from_str(&self.failures_json)? })
    }
}

/// Fila a insertar/actualizar en `job_executions`. `None` escribe NULL al
/// actualizar: el contexto de una ejecución COMPLETED se vacía así.
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = job_executions, treat_none_as_null = true)]
pub struct JobExecutionRecord {
    pub id: String,
    pub job_name: String,
    pub identity_hash: String,
    pub parameters_json: String,
    pub status: String,
    pub exit_code: String,
    pub exit_description: String,
    pub create_time: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub context_json: Option<String>,
    pub failures_json: String,
}

impl TryFrom<&JobExecution> for JobExecutionRecord {
    type Error = PersistenceError;

    fn try_from(e: &JobExecution) -> Result<Self, Self::Error> {
        let context_json = if e.status == BatchStatus::Completed {
            None
        } else {
            Some(serde_json::to_string(&e.context)?)
        };
        Ok(Self { id: e.id.to_string(),
                  job_name: e.job_name.clone(),
                  identity_hash: e.identity_hash.clone(),
                  parameters_json: serde_json::to_string(&e.parameters)?,
                  status: e.status.as_str().to_string(),
                  exit_code: e.exit_status.exit_code.clone(),
                  exit_description: e.exit_status.exit_description.clone(),
                  create_time: fmt_ts(e.create_time),
                  start_time: e.start_time.map(fmt_ts),
                  end_time: e.end_time.map(fmt_ts),
                  context_json,
                  failures_json: serde_json::to_string(&e.failures)? })
    }
}

#[derive(Queryable, Debug)]
pub struct StepExecutionRow {
    pub seq: i64,
    pub id: String,
    pub job_execution_id: String,
    pub step_name: String,
    pub status: String,
    pub exit_code: String,
    pub exit_description: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub read_count: i64,
    pub write_count: i64,
    pub skip_count: i64,
    pub commit_count: i64,
    pub rollback_count: i64,
    pub context_json: String,
    pub failures_json: String,
}

impl StepExecutionRow {
    pub fn into_domain(self) -> Result<StepExecution, PersistenceError> {
        Ok(StepExecution { id: parse_uuid(&self.id)?,
                           job_execution_id: parse_uuid(&self.job_execution_id)?,
                           step_name: self.step_name,
                           status: parse_status(&self.status)?,
                           exit_status: ExitStatus::new(self.exit_code).with_description(self.exit_description),
                           start_time: parse_opt_ts(self.start_time.as_deref())?,
                           end_time: parse_opt_ts(self.end_time.as_deref())?,
                           read_count: count_from_db(self.read_count),
                           write_count: count_from_db(self.write_count),
                           skip_count: count_from_db(self.skip_count),
                           commit_count: count_from_db(self.commit_count),
                           rollback_count: count_from_db(self.rollback_count),
                           context: serde_json::from_str(&self.context_json)?,
                           failures: serde_json::from_str(&self.failures_json)? })
    }
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = step_executions, treat_none_as_null = true)]
pub struct StepExecutionRecord {
    pub id: String,
    pub job_execution_id: String,
    pub step_name: String,
    pub status: String,
    pub exit_code: String,
    pub exit_description: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub read_count: i64,
    pub write_count: i64,
    pub skip_count: i64,
    pub commit_count: i64,
    pub rollback_count: i64,
    pub context_json: String,
    pub failures_json: String,
}

impl TryFrom<&StepExecution> for StepExecutionRecord {
    type Error = PersistenceError;

    fn try_from(s: &StepExecution) -> Result<Self, Self::Error> {
        Ok(Self { id: s.id.to_string(),
                  job_execution_id: s.job_execution_id.to_string(),
                  step_name: s.step_name.clone(),
                  status: s.status.as_str().to_string(),
                  exit_code: s.exit_status.exit_code.clone(),
                  exit_description: s.exit_status.exit_description.clone(),
                  start_time: s.start_time.map(fmt_ts),
                  end_time: s.end_time.map(fmt_ts),
                  read_count: count_to_db(s.read_count),
                  write_count: count_to_db(s.write_count),
                  skip_count: count_to_db(s.skip_count),
                  commit_count: count_to_db(s.commit_count),
                  rollback_count: count_to_db(s.rollback_count),
                  context_json: serde_json::to_string(&s.context)?,
                  failures_json: serde_json::to_string(&s.failures)? })
    }
}

/// Fila mapeada de la tabla `event_log`.
///
/// - `seq`: orden global de inserción.
/// - `event_seq`: posición dentro de la ejecución (0, 1, 2…), la que ve el core.
/// - `event_type`: variante en minúsculas (CHECK en el esquema).
/// - `payload`: JSON completo de `BatchEventKind`.
#[derive(Queryable, Debug)]
pub struct EventRow {
    pub seq: i64,
    pub job_execution_id: String,
    pub event_seq: i64,
    pub ts: String,
    pub event_type: String,
    pub payload: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = event_log)]
pub struct NewEventRow<'a> {
    pub job_execution_id: &'a str,
    pub event_seq: i64,
    pub ts: &'a str,
    pub event_type: &'a str,
    pub payload: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_job_record_drops_context() {
        let mut e = JobExecution::new("job", "h", ParameterSet::builder().add_long("run.id", 1).build(), Utc::now());
        e.context.put("k", "v");
        let running = JobExecutionRecord::try_from(&e).expect("record");
        assert_eq!(running.context_json.as_deref(), Some(r#"{"k":"v"}"#));
        e.status = BatchStatus::Completed;
        assert!(JobExecutionRecord::try_from(&e).expect("record").context_json.is_none());
    }

    #[test]
    fn job_row_maps_back_to_domain() {
        let mut e = JobExecution::new("job", "h", ParameterSet::builder().add_string("name", "x").build(), Utc::now());
        e.status = BatchStatus::Failed;
        e.exit_status = ExitStatus::failed().with_description("boom");
        e.start_time = Some(Utc::now());
        e.failures.push("write fault: disk".into());
        let r = JobExecutionRecord::try_from(&e).expect("record");
        let row = JobExecutionRow { seq: 1,
                                    id: r.id,
                                    job_name: r.job_name,
                                    identity_hash: r.identity_hash,
                                    parameters_json: r.parameters_json,
                                    status: r.status,
                                    exit_code: r.exit_code,
                                    exit_description: r.exit_description,
                                    create_time: r.create_time,
                                    start_time: r.start_time,
                                    end_time: r.end_time,
                                    context_json: r.context_json,
                                    failures_json: r.failures_json };
        assert_eq!(row.into_domain().expect("domain"), e);
    }

    #[test]
    fn bad_status_is_a_serialization_error() {
        assert!(matches!(parse_status("RUNNING"), Err(PersistenceError::Serialization(_))));
        assert!(parse_ts("ayer").is_err());
    }
}
