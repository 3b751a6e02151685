use batch_core::repo::check_instance;
use batch_core::{BatchEvent, BatchEventKind, ExecutionRepository, JobExecution, RepositoryError, StepExecution};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;
use uuid::Uuid;

use super::rows::{fmt_ts, parse_ts, EventRow, JobExecutionRecord, JobExecutionRow, NewEventRow, StepExecutionRecord, StepExecutionRow};
use super::{with_retry, ConnectionProvider, PoolProvider, SqlitePool};
use crate::error::PersistenceError;
use crate::schema::{event_log, job_executions, step_executions};

/// Mapea la variante del evento a un string en minúsculas, estable en el
/// tiempo (coincide con el CHECK de `event_log.event_type`).
pub fn event_type_for(kind: &BatchEventKind) -> &'static str {
    match kind {
        BatchEventKind::JobStarted { .. } => "jobstarted",
        BatchEventKind::StepStarted { .. } => "stepstarted",
        BatchEventKind::StepSkipped { .. } => "stepskipped",
        BatchEventKind::ChunkCommitted { .. } => "chunkcommitted",
        BatchEventKind::ChunkRolledBack { .. } => "chunkrolledback",
        BatchEventKind::StepFinished { .. } => "stepfinished",
        BatchEventKind::ContextPromoted { .. } => "contextpromoted",
        BatchEventKind::TransitionTaken { .. } => "transitiontaken",
        BatchEventKind::JobFinished { .. } => "jobfinished",
    }
}

fn event_from_row(row: EventRow) -> Result<BatchEvent, PersistenceError> {
    let job_execution_id = Uuid::parse_str(&row.job_execution_id).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    let kind: BatchEventKind = serde_json::from_str(&row.payload)?;
    Ok(BatchEvent { seq: u64::try_from(row.event_seq).unwrap_or(0),
                    job_execution_id,
                    kind,
                    ts: parse_ts(&row.ts)? })
}

fn jobs_from_rows(rows: Vec<JobExecutionRow>) -> Result<Vec<JobExecution>, PersistenceError> {
    rows.into_iter().map(JobExecutionRow::into_domain).collect()
}

fn steps_from_rows(rows: Vec<StepExecutionRow>) -> Result<Vec<StepExecution>, PersistenceError> {
    rows.into_iter().map(StepExecutionRow::into_domain).collect()
}

/// `ExecutionRepository` sobre SQLite.
///
/// Cada operación toma una conexión del proveedor y se reintenta completa
/// ante errores transitorios.
pub struct SqliteExecutionRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> SqliteExecutionRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn run<T, F>(&self, op: &str, mut f: F) -> Result<T, RepositoryError>
        where F: FnMut(&mut SqliteConnection) -> Result<T, PersistenceError>
    {
        debug!("{op}:start");
        let out = with_retry(|| {
            let mut conn = self.provider.connection()?;
            f(&mut *conn)
        });
        match &out {
            Ok(_) => debug!("{op}:done"),
            Err(e) => debug!("{op}:error {e}"),
        }
        out.map_err(RepositoryError::from)
    }
}

impl SqliteExecutionRepository<PoolProvider> {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self::new(PoolProvider { pool })
    }
}

impl<P: ConnectionProvider> ExecutionRepository for SqliteExecutionRepository<P> {
    fn last_job_execution(&self, job_name: &str) -> Result<Option<JobExecution>, RepositoryError> {
        self.run("last_job_execution", |conn| {
                job_executions::table.filter(job_executions::job_name.eq(job_name))
                                     .order(job_executions::seq.desc())
                                     .first::<JobExecutionRow>(conn)
                                     .optional()?
                                     .map(JobExecutionRow::into_domain)
                                     .transpose()
            })
    }

    fn find_job_executions(&self, identity_hash: &str) -> Result<Vec<JobExecution>, RepositoryError> {
        self.run("find_job_executions", |conn| {
                let rows = job_executions::table.filter(job_executions::identity_hash.eq(identity_hash))
                                                .order(job_executions::seq.asc())
                                                .load::<JobExecutionRow>(conn)?;
                jobs_from_rows(rows)
            })
    }

    fn create_job_execution(&self, execution: &JobExecution) -> Result<(), RepositoryError> {
        let record = JobExecutionRecord::try_from(execution)?;
        self.run("create_job_execution", |conn| {
                conn.immediate_transaction::<_, PersistenceError, _>(|tx| {
                        let existing = job_executions::table.filter(job_executions::identity_hash.eq(&record.identity_hash))
                                                            .order(job_executions::seq.asc())
                                                            .load::<JobExecutionRow>(tx)?;
                        let existing = jobs_from_rows(existing)?;
                        check_instance(&record.job_name, &record.identity_hash, &existing).map_err(PersistenceError::Conflict)?;
                        diesel::insert_into(job_executions::table).values(&record).execute(tx)?;
                        Ok(())
                    })
            })
    }

    fn update_job_execution(&self, execution: &JobExecution) -> Result<(), RepositoryError> {
        let record = JobExecutionRecord::try_from(execution)?;
        self.run("update_job_execution", |conn| {
                let n = diesel::update(job_executions::table.filter(job_executions::id.eq(&record.id))).set(&record)
                                                                                                      .execute(conn)?;
                if n == 0 {
                    return Err(PersistenceError::Conflict(RepositoryError::NotFound(format!("job execution {}",
                                                                                            record.id))));
                }
                Ok(())
            })
    }

    fn get_job_execution(&self, id: Uuid) -> Result<Option<JobExecution>, RepositoryError> {
        let id = id.to_string();
        self.run("get_job_execution", |conn| {
                job_executions::table.filter(job_executions::id.eq(&id))
                                     .first::<JobExecutionRow>(conn)
                                     .optional()?
                                     .map(JobExecutionRow::into_domain)
                                     .transpose()
            })
    }

    fn list_job_executions(&self, job_name: Option<&str>) -> Result<Vec<JobExecution>, RepositoryError> {
        self.run("list_job_executions", |conn| {
                let rows = match job_name {
                    Some(name) => job_executions::table.filter(job_executions::job_name.eq(name))
                                                       .order(job_executions::seq.asc())
                                                       .load::<JobExecutionRow>(conn)?,
                    None => job_executions::table.order(job_executions::seq.asc())
                                                 .load::<JobExecutionRow>(conn)?,
                };
                jobs_from_rows(rows)
            })
    }

    fn save_step_execution(&self, step: &StepExecution) -> Result<(), RepositoryError> {
        let record = StepExecutionRecord::try_from(step)?;
        self.run("save_step_execution", |conn| {
                conn.immediate_transaction::<_, PersistenceError, _>(|tx| {
                        let n = diesel::update(step_executions::table.filter(step_executions::id.eq(&record.id))).set(&record)
                                                                                                                .execute(tx)?;
                        if n == 0 {
                            diesel::insert_into(step_executions::table).values(&record).execute(tx)?;
                        }
                        Ok(())
                    })
            })
    }

    fn step_executions(&self, job_execution_id: Uuid) -> Result<Vec<StepExecution>, RepositoryError> {
        let job_id = job_execution_id.to_string();
        self.run("step_executions", |conn| {
                let rows = step_executions::table.filter(step_executions::job_execution_id.eq(&job_id))
                                                 .order(step_executions::seq.asc())
                                                 .load::<StepExecutionRow>(conn)?;
                steps_from_rows(rows)
            })
    }

    fn last_step_execution(&self, identity_hash: &str, step_name: &str) -> Result<Option<StepExecution>, RepositoryError> {
        self.run("last_step_execution", |conn| {
                let job_ids: Vec<String> = job_executions::table.filter(job_executions::identity_hash.eq(identity_hash))
                                                                .select(job_executions::id)
                                                                .load(conn)?;
                step_executions::table.filter(step_executions::step_name.eq(step_name))
                                      .filter(step_executions::job_execution_id.eq_any(job_ids))
                                      .order(step_executions::seq.desc())
                                      .first::<StepExecutionRow>(conn)
                                      .optional()?
                                      .map(StepExecutionRow::into_domain)
                                      .transpose()
            })
    }

    fn append_event(&self, job_execution_id: Uuid, kind: BatchEventKind, ts: DateTime<Utc>) -> Result<BatchEvent, RepositoryError> {
        let payload = serde_json::to_string(&kind)?;
        let event_type = event_type_for(&kind);
        let job_id = job_execution_id.to_string();
        let ts_raw = fmt_ts(ts);
        let event_seq = self.run("append_event", |conn| {
                                conn.immediate_transaction::<_, PersistenceError, _>(|tx| {
                                        let next: i64 = event_log::table.filter(event_log::job_execution_id.eq(&job_id))
                                                                         .count()
                                                                         .get_result(tx)?;
                                        diesel::insert_into(event_log::table).values(NewEventRow { job_execution_id: &job_id,
                                                                                                   event_seq: next,
                                                                                                   ts: &ts_raw,
                                                                                                   event_type,
                                                                                                   payload: &payload })
                                                                             .execute(tx)?;
                                        Ok(next)
                                    })
                            })?;
        Ok(BatchEvent { seq: u64::try_from(event_seq).unwrap_or(0),
                        job_execution_id,
                        kind,
                        ts })
    }

    fn list_events(&self, job_execution_id: Uuid) -> Result<Vec<BatchEvent>, RepositoryError> {
        let job_id = job_execution_id.to_string();
        self.run("list_events", |conn| {
                event_log::table.filter(event_log::job_execution_id.eq(&job_id))
                                .order(event_log::event_seq.asc())
                                .load::<EventRow>(conn)?
                                .into_iter()
                                .map(event_from_row)
                                .collect()
            })
    }
}
