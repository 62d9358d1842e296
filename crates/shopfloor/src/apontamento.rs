//! Apontamento lifecycle: `start → pause/finish`, plus the one-shot
//! submission paths used by the legacy form and batch confirmation.
//!
//! An operator holds at most one open entry (no end timestamp) per company.
//! The store enforces this; `start` only translates the outcome.

use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use crate::db::apontamento_repo::{
    self, ApontamentoListRow, CompletedApontamento, NewOpenApontamento, OpenOutcome,
};
use crate::db::Database;
use crate::error::{Result, ShopfloorError, CODE_APONTAMENTO_OPEN};
use crate::requests::{BatchHeader, BatchItem, StartApontamento, SubmitApontamento};
use crate::timing::calc_end_datetime;

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Opens a new entry and returns its id.
///
/// Fails with `Conflict` carrying the existing entry when the operator
/// already has one open for the same company.
pub fn start(db: &Database, req: &StartApontamento) -> Result<i64> {
    let _span = info_span!(
        "apontamento.start",
        job = %req.job_number,
        operator = %req.operator_code,
        company = %req.company_id
    )
    .entered();

    let entry = NewOpenApontamento {
        job_number: req.job_number.clone(),
        operator_code: req.operator_code.clone(),
        company_id: req.company_id.clone(),
        operation_code: req.operation_code.clone(),
    };

    match apontamento_repo::insert_open(db, &entry, now())? {
        OpenOutcome::Opened(id) => {
            info!(apontamento_id = id, "Apontamento started");
            Ok(id)
        }
        OpenOutcome::AlreadyOpen(open) => {
            warn!(
                open_id = open.apontamento_id,
                open_job = %open.job_number,
                "Operator already has an open apontamento"
            );
            Err(ShopfloorError::Conflict {
                code: CODE_APONTAMENTO_OPEN,
                message: format!(
                    "Operator {} already has an apontamento in progress (job {})",
                    req.operator_code, open.job_number
                ),
                open,
            })
        }
    }
}

/// Stamps the end time. Status and quantity are left untouched, and the
/// entry's current state is not checked.
pub fn pause(db: &Database, apontamento_id: i64) -> Result<()> {
    let _span = info_span!("apontamento.pause", apontamento_id).entered();
    if apontamento_repo::mark_paused(db, apontamento_id, now())? == 0 {
        return Err(not_found(apontamento_id));
    }
    info!("Apontamento paused");
    Ok(())
}

/// Stamps the end time, records the good quantity and closes the entry.
pub fn finish(db: &Database, apontamento_id: i64, quantity_good: i64) -> Result<()> {
    let _span = info_span!("apontamento.finish", apontamento_id, quantity_good).entered();
    if apontamento_repo::mark_finished(db, apontamento_id, quantity_good, now())? == 0 {
        return Err(not_found(apontamento_id));
    }
    info!("Apontamento finished");
    Ok(())
}

fn not_found(apontamento_id: i64) -> ShopfloorError {
    ShopfloorError::not_found(format!("Apontamento {} not found", apontamento_id))
}

/// Writes a complete entry from a start time and an `HH:MM:SS[.ffffff]`
/// duration. Returns the new id.
pub fn submit(db: &Database, req: &SubmitApontamento) -> Result<i64> {
    let _span = info_span!(
        "apontamento.submit",
        job = %req.job_number,
        operator = %req.operator_code
    )
    .entered();

    let (started_at, ended_at) = calc_end_datetime(&req.start_time, &req.duration)?;
    let id = apontamento_repo::insert_completed(
        db,
        &CompletedApontamento {
            job_number: req.job_number.clone(),
            operator_code: req.operator_code.clone(),
            company_id: req.company_id.clone(),
            operation_code: req.sequence_code.clone(),
            started_at,
            ended_at,
            quantity_good: req.quantity,
            integration_error: Some(req.integration_error.clone()),
        },
        now(),
    )?;
    info!(apontamento_id = id, "Apontamento submitted");
    Ok(id)
}

/// Submits every item of a batch independently and returns how many were
/// stored. A failing item is logged and skipped; earlier items stay.
pub fn confirm_batch(db: &Database, header: &BatchHeader, items: &[Value]) -> usize {
    let _span = info_span!(
        "apontamento.confirm_batch",
        job = %header.job_number,
        operator = %header.operator_code,
        items = items.len()
    )
    .entered();

    let mut processed = 0;
    for (index, raw) in items.iter().enumerate() {
        match confirm_item(db, header, raw) {
            Ok(id) => {
                debug!(index, apontamento_id = id, "Batch item stored");
                processed += 1;
            }
            Err(e) => warn!(index, error = %e, "Skipping batch item"),
        }
    }

    info!(processed, total = items.len(), "Batch confirmed");
    processed
}

fn confirm_item(db: &Database, header: &BatchHeader, raw: &Value) -> Result<i64> {
    let item: BatchItem = serde_json::from_value(raw.clone())
        .map_err(|e| ShopfloorError::validation(format!("Malformed batch item: {}", e)))?;
    let (started_at, ended_at) = calc_end_datetime(&item.start_time, &item.total_time)?;

    Ok(apontamento_repo::insert_completed(
        db,
        &CompletedApontamento {
            job_number: header.job_number.clone(),
            operator_code: header.operator_code.clone(),
            company_id: header.company_id.clone(),
            operation_code: header.sequence_code.clone(),
            started_at,
            ended_at,
            quantity_good: item.quantity()?,
            integration_error: None,
        },
        now(),
    )?)
}

/// All entries of a job, most recent start first.
pub fn list(db: &Database, job_number: &str) -> Result<Vec<ApontamentoListRow>> {
    let _span = info_span!("apontamento.list", job = %job_number).entered();
    Ok(apontamento_repo::list_by_job(db, job_number)?)
}
