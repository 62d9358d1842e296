//! Operator job queue and per-job detail aggregation.

use serde::Serialize;
use tracing::{debug, info_span};

use crate::db::sequencing_repo::{self, JobDetails, MaterialRow, SequencingRow};
use crate::db::Database;
use crate::error::{Result, ShopfloorError};

/// Routing details and bill of materials of one job sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFullDetails {
    pub of_id: String,
    pub empresa: String,
    #[serde(flatten)]
    pub details: JobDetails,
    pub materiais: Vec<MaterialRow>,
}

/// The operator's queue, one row per (job, sequence). An operator with no
/// assignments gets an empty list.
pub fn sequencing(db: &Database, operator_code: &str) -> Result<Vec<SequencingRow>> {
    let _span = info_span!("sequencing", operator = %operator_code).entered();
    let rows = sequencing_repo::fetch_sequencing(db, operator_code)?;
    debug!(rows = rows.len(), "Sequencing loaded");
    Ok(rows)
}

pub fn job_details(
    db: &Database,
    job_number: &str,
    company_id: &str,
    sequence_code: &str,
) -> Result<Option<JobDetails>> {
    Ok(sequencing_repo::fetch_job_details(
        db,
        job_number,
        company_id,
        sequence_code,
    )?)
}

pub fn job_materials(db: &Database, job_number: &str, company_id: &str) -> Result<Vec<MaterialRow>> {
    Ok(sequencing_repo::fetch_job_materials(db, job_number, company_id)?)
}

/// Composes routing details and materials. Fails with `NotFound` when the
/// sequence has no routing row, whatever the materials hold.
pub fn full_details(
    db: &Database,
    job_number: &str,
    company_id: &str,
    sequence_code: &str,
) -> Result<JobFullDetails> {
    let _span = info_span!(
        "sequencing.full_details",
        job = %job_number,
        company = %company_id,
        sequence = %sequence_code
    )
    .entered();

    let details = job_details(db, job_number, company_id, sequence_code)?.ok_or_else(|| {
        ShopfloorError::not_found(format!(
            "Job {} has no operation data for sequence {}",
            job_number, sequence_code
        ))
    })?;
    let materiais = job_materials(db, job_number, company_id)?;

    Ok(JobFullDetails {
        of_id: job_number.to_string(),
        empresa: company_id.to_string(),
        details,
        materiais,
    })
}
