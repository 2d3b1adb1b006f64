//! Tests for the synchronous facade. These are plain `#[test]`s on purpose:
//! the blocking runner owns its own runtime.

use std::sync::Arc;

use bqrun_bigquery::*;

use crate::stub::{StubService, WaitOutcome};

#[test]
fn test_blocking_run_iterates_all_pages() {
    let stub = Arc::new(StubService::integers(vec![vec![1, 2], vec![3]]));
    let runner = BlockingQueryRunner::new(QueryRunner::new(Arc::clone(&stub))).unwrap();

    let mut rows = runner.run("SELECT x FROM t").unwrap();
    assert_eq!(rows.schema().index_of("x"), Some(0));
    assert_eq!(stub.fetches(), 1);

    let first = rows.next().unwrap().unwrap();
    assert_eq!(first.get("x").and_then(|v| v.as_i64()), Some(1));

    let rest: Vec<i64> = rows
        .map(|r| r.unwrap().get("x").and_then(|v| v.as_i64()).unwrap())
        .collect();
    assert_eq!(rest, vec![2, 3]);
    assert_eq!(stub.fetches(), 2);
}

#[test]
fn test_blocking_next_after_end_stays_none() {
    let stub = Arc::new(StubService::integers(vec![vec![1]]));
    let runner = BlockingQueryRunner::new(QueryRunner::new(Arc::clone(&stub))).unwrap();

    let mut rows = runner.run("SELECT 1 AS x").unwrap();
    assert!(rows.next().unwrap().is_ok());
    assert!(rows.next().is_none());
    assert!(rows.next().is_none());
    assert!(rows.next().is_none());
    assert_eq!(stub.fetches(), 1);
}

#[test]
fn test_blocking_next_after_page_error_stays_none() {
    let stub = Arc::new(StubService::integers(vec![vec![1], vec![2]]).failing_page(1));
    let runner = BlockingQueryRunner::new(QueryRunner::new(Arc::clone(&stub))).unwrap();

    let mut rows = runner.run("SELECT x FROM t").unwrap();
    assert!(rows.next().unwrap().is_ok());
    assert!(rows.next().unwrap().is_err());
    assert!(rows.next().is_none());
    assert!(rows.next().is_none());
    assert_eq!(stub.fetches(), 2);
}

#[test]
fn test_blocking_run_surfaces_job_errors() {
    let stub = Arc::new(StubService::integers(vec![vec![1]]).with_outcome(WaitOutcome::Lost));
    let runner = BlockingQueryRunner::new(QueryRunner::new(Arc::clone(&stub))).unwrap();

    let err = runner.run("SELECT 1 AS x").unwrap_err();
    assert!(matches!(err, QueryError::JobLost { .. }));
    assert_eq!(stub.fetches(), 0);
}

#[test]
fn test_blocking_runs_are_independent() {
    let stub = Arc::new(StubService::integers(vec![vec![5]]));
    let runner = BlockingQueryRunner::new(QueryRunner::new(Arc::clone(&stub))).unwrap();

    let a: Vec<_> = runner.run("SELECT 5 AS x").unwrap().collect();
    let b: Vec<_> = runner.run("SELECT 5 AS x").unwrap().collect();

    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    let ids = stub.submitted_ids();
    assert_ne!(ids[0], ids[1]);
}
