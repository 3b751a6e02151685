use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::types::{check_instance, ExecutionRepository};
use crate::errors::RepositoryError;
use crate::event::{BatchEvent, BatchEventKind};
use crate::execution::{BatchStatus, JobExecution, StepExecution};

#[derive(Default)]
struct Inner {
    jobs: Vec<JobExecution>,
    steps: Vec<StepExecution>,
    events: HashMap<Uuid, Vec<BatchEvent>>,
}

/// Repositorio en memoria; un único mutex hace atómico check-and-create.
#[derive(Default)]
pub struct InMemoryExecutionRepository {
    inner: Mutex<Inner>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Copia a almacenar: sin contexto si la ejecución completó.
fn stored(execution: &JobExecution) -> JobExecution {
    let mut e = execution.clone();
    if e.status == BatchStatus::Completed {
        e.context.clear();
    }
    e
}

impl ExecutionRepository for InMemoryExecutionRepository {
    fn last_job_execution(&self, job_name: &str) -> Result<Option<JobExecution>, RepositoryError> {
        Ok(self.inner.lock().jobs.iter().rev().find(|e| e.job_name == job_name).cloned())
    }

    fn find_job_executions(&self, identity_hash: &str) -> Result<Vec<JobExecution>, RepositoryError> {
        Ok(self.inner.lock().jobs.iter().filter(|e| e.identity_hash == identity_hash).cloned().collect())
    }

    fn create_job_execution(&self, execution: &JobExecution) -> Result<(), RepositoryError> {
        let mut g = self.inner.lock();
        let existing: Vec<JobExecution> = g.jobs.iter().filter(|e| e.identity_hash == execution.identity_hash).cloned().collect();
        check_instance(&execution.job_name, &execution.identity_hash, &existing)?;
        g.jobs.push(stored(execution));
        Ok(())
    }

    fn update_job_execution(&self, execution: &JobExecution) -> Result<(), RepositoryError> {
        let mut g = self.inner.lock();
        let slot = g.jobs
                    .iter_mut()
                    .find(|e| e.id == execution.id)
                    .ok_or_else(|| RepositoryError::NotFound(format!("job execution {}", execution.id)))?;
        *slot = stored(execution);
        Ok(())
    }

    fn get_job_execution(&self, id: Uuid) -> Result<Option<JobExecution>, RepositoryError> {
        Ok(self.inner.lock().jobs.iter().find(|e| e.id == id).cloned())
    }

    fn list_job_executions(&self, job_name: Option<&str>) -> Result<Vec<JobExecution>, RepositoryError> {
        Ok(self.inner
               .lock()
               .jobs
               .iter()
               .filter(|e| job_name.map(|n| e.job_name == n).unwrap_or(true))
               .cloned()
               .collect())
    }

    fn save_step_execution(&self, step: &StepExecution) -> Result<(), RepositoryError> {
        let mut g = self.inner.lock();
        match g.steps.iter().position(|s| s.id == step.id) {
            Some(i) => g.steps[i] = step.clone(),
            None => g.steps.push(step.clone()),
        }
        Ok(())
    }

    fn step_executions(&self, job_execution_id: Uuid) -> Result<Vec<StepExecution>, RepositoryError> {
        Ok(self.inner.lock().steps.iter().filter(|s| s.job_execution_id == job_execution_id).cloned().collect())
    }

    fn last_step_execution(&self, identity_hash: &str, step_name: &str) -> Result<Option<StepExecution>, RepositoryError> {
        let g = self.inner.lock();
        let ids: Vec<Uuid> = g.jobs.iter().filter(|e| e.identity_hash == identity_hash).map(|e| e.id).collect();
        Ok(g.steps.iter().rev().find(|s| s.step_name == step_name && ids.contains(&s.job_execution_id)).cloned())
    }

    fn append_event(&self, job_execution_id: Uuid, kind: BatchEventKind, ts: DateTime<Utc>) -> Result<BatchEvent, RepositoryError> {
        let mut g = self.inner.lock();
        let list = g.events.entry(job_execution_id).or_default();
        let ev = BatchEvent { seq: list.len() as u64,
                              job_execution_id,
                              kind,
                              ts };
        list.push(ev.clone());
        Ok(ev)
    }

    fn list_events(&self, job_execution_id: Uuid) -> Result<Vec<BatchEvent>, RepositoryError> {
        Ok(self.inner.lock().events.get(&job_execution_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterSet;

    fn exec(hash: &str, status: BatchStatus) -> JobExecution {
        let mut e = JobExecution::new("job", hash, ParameterSet::empty(), Utc::now());
        e.status = status;
        e
    }

    #[test]
    fn create_rejects_completed_and_running_instances() {
        let repo = InMemoryExecutionRepository::new();
        repo.create_job_execution(&exec("h1", BatchStatus::Completed)).expect("first");
        assert!(matches!(repo.create_job_execution(&exec("h1", BatchStatus::Starting)), Err(RepositoryError::DuplicateRun { .. })));
        repo.create_job_execution(&exec("h2", BatchStatus::Started)).expect("first");
        assert!(matches!(repo.create_job_execution(&exec("h2", BatchStatus::Starting)), Err(RepositoryError::AlreadyRunning { .. })));
        repo.create_job_execution(&exec("h3", BatchStatus::Failed)).expect("first");
        repo.create_job_execution(&exec("h3", BatchStatus::Starting)).expect("restart allowed");
        assert_eq!(repo.find_job_executions("h3").expect("find").len(), 2);
    }

    #[test]
    fn completed_execution_drops_context() {
        let repo = InMemoryExecutionRepository::new();
        let mut e = exec("h", BatchStatus::Started);
        e.context.put("k", 1);
        repo.create_job_execution(&e).expect("create");
        assert_eq!(repo.get_job_execution(e.id).expect("get").expect("row").context.get_i64("k"), Some(1));
        e.status = BatchStatus::Completed;
        repo.update_job_execution(&e).expect("update");
        assert!(repo.get_job_execution(e.id).expect("get").expect("row").context.is_empty());
    }

    #[test]
    fn events_get_sequential_numbers() {
        let repo = InMemoryExecutionRepository::new();
        let id = Uuid::new_v4();
        repo.append_event(id, BatchEventKind::StepStarted { step_name: "a".into() }, Utc::now()).expect("append");
        let ev = repo.append_event(id, BatchEventKind::StepStarted { step_name: "b".into() }, Utc::now()).expect("append");
        assert_eq!(ev.seq, 1);
        assert_eq!(repo.list_events(id).expect("list").len(), 2);
    }
}
