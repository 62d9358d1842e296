//! Apontamento lifecycle against a file-backed, pooled database.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use serde_json::json;
use shopfloor::apontamento;
use shopfloor::requests::{ConfirmBatchRequest, StartRequest};
use shopfloor::ShopfloorError;

use common::TestHarness;

fn start_for(operator: &str, job: &str, company: &str) -> shopfloor::requests::StartApontamento {
    let req: StartRequest = serde_json::from_value(json!({
        "of_id": job,
        "empresa_id": company,
        "operator_code": operator,
    }))
    .unwrap();
    req.validate().unwrap()
}

#[test]
fn test_second_start_is_rejected_and_not_stored() {
    let harness = TestHarness::new();
    let first = apontamento::start(&harness.db, &start_for("100", "OF1", "1")).unwrap();

    let err = apontamento::start(&harness.db, &start_for("100", "OF2", "1")).unwrap_err();
    match err {
        ShopfloorError::Conflict { code, open, .. } => {
            assert_eq!(code, "APONTAMENTO_ABERTO");
            assert_eq!(open.apontamento_id, first);
            assert_eq!(open.job_number, "OF1");
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    assert_eq!(
        harness.count("SELECT COUNT(*) FROM apontamentos WHERE ended_at IS NULL"),
        1
    );
}

#[test]
fn test_concurrent_starts_open_exactly_one_entry() {
    let harness = TestHarness::with_pool_size(8);
    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|i| {
            let db = harness.db.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let req = start_for("100", &format!("OF{}", i), "1");
                barrier.wait();
                apontamento::start(&db, &req)
            })
        })
        .collect();

    let mut opened = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => opened += 1,
            Err(ShopfloorError::Conflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(opened, 1);
    assert_eq!(conflicts, workers - 1);
    assert_eq!(
        harness.count("SELECT COUNT(*) FROM apontamentos WHERE ended_at IS NULL"),
        1
    );
}

#[test]
fn test_pause_resume_finish() {
    let harness = TestHarness::new();
    let first = apontamento::start(&harness.db, &start_for("100", "OF1", "1")).unwrap();
    apontamento::pause(&harness.db, first).unwrap();

    // Resuming opens a fresh entry for the same job.
    let second = apontamento::start(&harness.db, &start_for("100", "OF1", "1")).unwrap();
    assert_ne!(first, second);
    apontamento::finish(&harness.db, second, 12).unwrap();

    let rows = apontamento::list(&harness.db, "OF1").unwrap();
    assert_eq!(rows.len(), 2);
    let closed: Vec<_> = rows
        .iter()
        .filter(|r| r.status == Some(shopfloor::db::apontamento_repo::ApontamentoStatus::Closed))
        .collect();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, second);
    assert_eq!(closed[0].quantity_good, Some(12));
    assert!(rows.iter().all(|r| r.ended_at.is_some()));
}

#[test]
fn test_entries_survive_reopen() {
    let harness = TestHarness::new();
    let id = apontamento::start(&harness.db, &start_for("100", "OF1", "1")).unwrap();

    let reopened = harness.reopen();
    let err = apontamento::start(&reopened, &start_for("100", "OF3", "1")).unwrap_err();
    assert!(matches!(err, ShopfloorError::Conflict { ref open, .. } if open.apontamento_id == id));
}

#[test]
fn test_confirm_batch_partial_failure() {
    let harness = TestHarness::new();
    let req: ConfirmBatchRequest = serde_json::from_value(json!({
        "apontamento_id": "OF1",
        "operator_code": "100",
        "soc_empresa": "1",
        "soc_codseq": "10",
        "items": [
            {"start_time": "2024-01-01 08:00:00", "total_time": "01:00:00", "qtd_apontar": 5},
            {"start_time": "2024-01-01 09:00:00", "total_time": "one hour"},
            {"start_time": "2024-01-01 10:00:00", "total_time": "00:45:00.250000", "qtd_apontar": "2"}
        ]
    }))
    .unwrap();
    let header = req.validate().unwrap();

    let processed = apontamento::confirm_batch(&harness.db, &header, &req.items);
    assert_eq!(processed, 2);

    let rows = apontamento::list(&harness.db, "OF1").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].started_at.as_deref(), Some("01/01/2024 10:00:00"));
    assert_eq!(rows[0].ended_at.as_deref(), Some("01/01/2024 10:45:00"));
    assert_eq!(rows[1].quantity_good, Some(5));
}
