
use std::sync::{Arc, Barrier};

use batch_core::{BatchEventKind, BatchStatus, ExecutionRepository, ExitStatus, JobExecution, ParameterSet, RepositoryError, StepExecution};
use batch_persistence::schema::{event_log, job_executions};
use batch_persistence::sqlite::NewEventRow;
use batch_persistence::PersistenceError;
use chrono::Utc;
use diesel::prelude::*;
use test_support::fresh_db;
use uuid::Uuid;

fn exec(hash: &str, status: BatchStatus) -> JobExecution {
    let params = ParameterSet::builder().add_string("name", "sqlite").add_long("run.id", 1).build();
    let mut e = JobExecution::new("job", hash, params, Utc::now());
    e.status = status;
    e
}

#[test]
fn create_enforces_instance_rule() {
    let db = fresh_db();
    let repo = db.repository();
    repo.create_job_execution(&exec("h1", BatchStatus::Completed)).expect("first");
    assert!(matches!(repo.create_job_execution(&exec("h1", BatchStatus::Starting)), Err(RepositoryError::DuplicateRun { .. })));

    repo.create_job_execution(&exec("h2", BatchStatus::Started)).expect("first");
    assert!(matches!(repo.create_job_execution(&exec("h2", BatchStatus::Starting)), Err(RepositoryError::AlreadyRunning { .. })));

    repo.create_job_execution(&exec("h3", BatchStatus::Failed)).expect("first");
    repo.create_job_execution(&exec("h3", BatchStatus::Starting)).expect("restart allowed");
    assert_eq!(repo.find_job_executions("h3").expect("find").len(), 2);
    assert_eq!(repo.list_job_executions(None).expect("list").len(), 4);
}

#[test]
fn concurrent_creates_of_one_identity_admit_exactly_one() {
    let db = fresh_db();
    let repo = db.repository();
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4).map(|_| {
                                    let (repo, barrier) = (repo.clone(), barrier.clone());
                                    std::thread::spawn(move || {
                                        barrier.wait();
                                        repo.create_job_execution(&exec("same", BatchStatus::Starting))
                                    })
                                })
                                .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().expect("join")).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter()
                   .filter_map(|r| r.as_ref().err())
                   .all(|e| matches!(e, RepositoryError::AlreadyRunning { .. })));
    assert_eq!(repo.find_job_executions("same").expect("find").len(), 1);
}

#[test]
fn job_row_roundtrips_and_completed_context_is_null() {
    let db = fresh_db();
    let repo = db.repository();
    let mut e = exec("h", BatchStatus::Started);
    e.start_time = Some(Utc::now());
    e.context.put("promotedKey", "value-from-step1");
    repo.create_job_execution(&e).expect("create");
    assert_eq!(repo.get_job_execution(e.id).expect("get"), Some(e.clone()));

    e.status = BatchStatus::Completed;
    e.exit_status = ExitStatus::completed();
    e.end_time = Some(Utc::now());
    repo.update_job_execution(&e).expect("update");

    let mut conn = db.pool.get().expect("conn");
    let raw: Option<String> = job_executions::table.filter(job_executions::id.eq(e.id.to_string()))
                                                   .select(job_executions::context_json)
                                                   .first(&mut conn)
                                                   .expect("row");
    assert!(raw.is_none());
    let stored = repo.get_job_execution(e.id).expect("get").expect("row");
    assert!(stored.context.is_empty());
    assert_eq!(stored.exit_status.exit_code, "COMPLETED");
    assert_eq!(repo.last_job_execution("job").expect("last").map(|j| j.id), Some(e.id));
}

#[test]
fn updating_unknown_execution_is_not_found() {
    let db = fresh_db();
    let repo = db.repository();
    assert!(matches!(repo.update_job_execution(&exec("h", BatchStatus::Started)), Err(RepositoryError::NotFound(_))));
}

#[test]
fn step_rows_upsert_and_last_step_spans_executions() {
    let db = fresh_db();
    let repo = db.repository();
    let first = exec("inst", BatchStatus::Failed);
    repo.create_job_execution(&first).expect("create");
    let mut s = StepExecution::new(first.id, "load");
    repo.save_step_execution(&s).expect("insert");
    s.read_count = 4;
    s.write_count = 4;
    s.commit_count = 2;
    s.status = BatchStatus::Failed;
    s.context.put("reader.read.count", 4);
    s.failures.push("write fault: sink unavailable".into());
    repo.save_step_execution(&s).expect("update");

    let steps = repo.step_executions(first.id).expect("steps");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0], s);

    let second = exec("inst", BatchStatus::Starting);
    repo.create_job_execution(&second).expect("restart");
    let last = repo.last_step_execution("inst", "load").expect("last").expect("some");
    assert_eq!(last.id, s.id);
    assert_eq!(last.context.get_i64("reader.read.count"), Some(4));
    assert!(repo.last_step_execution("inst", "other").expect("last").is_none());
    assert!(repo.last_step_execution("nope", "load").expect("last").is_none());
}

#[test]
fn step_for_missing_job_violates_foreign_key() {
    let db = fresh_db();
    let repo = db.repository();
    let orphan = StepExecution::new(Uuid::new_v4(), "load");
    assert!(matches!(repo.save_step_execution(&orphan), Err(RepositoryError::Storage(_))));
}

#[test]
fn events_are_numbered_per_execution_and_decoded() {
    let db = fresh_db();
    let repo = db.repository();
    let (a, b) = (exec("a", BatchStatus::Started), exec("b", BatchStatus::Started));
    repo.create_job_execution(&a).expect("a");
    repo.create_job_execution(&b).expect("b");
    repo.append_event(a.id, BatchEventKind::StepStarted { step_name: "s".into() }, Utc::now()).expect("append");
    repo.append_event(b.id, BatchEventKind::StepStarted { step_name: "s".into() }, Utc::now()).expect("append");
    let ev = repo.append_event(a.id,
                               BatchEventKind::ChunkCommitted { step_name: "s".into(),
                                                                commit: 1,
                                                                read: 2,
                                                                written: 2 },
                               Utc::now())
                 .expect("append");
    assert_eq!(ev.seq, 1);

    let events = repo.list_events(a.id).expect("list");
    assert_eq!(events.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(events[1].kind, ev.kind);
    assert_eq!(repo.list_events(b.id).expect("list").len(), 1);
}

#[test]
fn event_type_outside_the_closed_set_is_rejected() {
    let db = fresh_db();
    let repo = db.repository();
    let e = exec("h", BatchStatus::Started);
    repo.create_job_execution(&e).expect("create");
    let id = e.id.to_string();
    let ts = Utc::now().to_rfc3339();
    let mut conn = db.pool.get().expect("conn");
    let err = diesel::insert_into(event_log::table).values(NewEventRow { job_execution_id: &id,
                                                                         event_seq: 0,
                                                                         ts: &ts,
                                                                         event_type: "bogus",
                                                                         payload: "{}" })
                                                   .execute(&mut conn)
                                                   .map_err(PersistenceError::from)
                                                   .expect_err("check constraint");
    assert!(matches!(err, PersistenceError::CheckViolation(_)) || err.to_string().contains("CHECK"),
            "unexpected error: {err}");
}

#[test]
fn migrations_are_idempotent_across_pools() {
    let db = fresh_db();
    let repo = db.repository();
    repo.create_job_execution(&exec("h", BatchStatus::Failed)).expect("create");
    let reopened = db.reopen();
    let again = batch_persistence::SqliteExecutionRepository::from_pool(reopened);
    assert_eq!(again.find_job_executions("h").expect("find").len(), 1);
}
