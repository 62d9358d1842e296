//! Apontamento repository: work-time entries recorded against jobs.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::{format_timestamp, Database, DatabaseError};

/// Lifecycle status of an entry. Rows written by the legacy submit path
/// carry no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApontamentoStatus {
    Open,
    Closed,
}

impl ApontamentoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApontamentoStatus::Open => "open",
            ApontamentoStatus::Closed => "closed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ApontamentoStatus::Open),
            "closed" => Some(ApontamentoStatus::Closed),
            other => {
                log::warn!("Unknown apontamento status '{}'", other);
                None
            }
        }
    }
}

/// Identity of the entry that keeps an operator busy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenApontamento {
    pub apontamento_id: i64,
    #[serde(rename = "of_id")]
    pub job_number: String,
    #[serde(rename = "inicio")]
    pub started_at: String,
    #[serde(rename = "operacao")]
    pub operation_code: Option<String>,
}

impl OpenApontamento {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            apontamento_id: row.get("id")?,
            job_number: row.get("job_number")?,
            started_at: row.get("started_at")?,
            operation_code: row.get("operation_code")?,
        })
    }
}

/// A stored entry with raw timestamps.
#[derive(Debug, Clone)]
pub struct ApontamentoRecord {
    pub id: i64,
    pub job_number: String,
    pub operator_code: String,
    pub company_id: String,
    pub operation_code: Option<String>,
    pub shift_code: Option<i64>,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub quantity_good: Option<i64>,
    pub status: Option<ApontamentoStatus>,
    pub integration_error: Option<String>,
}

impl ApontamentoRecord {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: Option<String> = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            job_number: row.get("job_number")?,
            operator_code: row.get("operator_code")?,
            company_id: row.get("company_id")?,
            operation_code: row.get("operation_code")?,
            shift_code: row.get("shift_code")?,
            started_at: row.get("started_at")?,
            ended_at: row.get("ended_at")?,
            quantity_good: row.get("quantity_good")?,
            status: status.as_deref().and_then(ApontamentoStatus::parse),
            integration_error: row.get("integration_error")?,
        })
    }
}

/// Listing row. Timestamps are formatted `DD/MM/YYYY HH:MM:SS` by the query.
#[derive(Debug, Clone, Serialize)]
pub struct ApontamentoListRow {
    #[serde(rename = "SOF_APONTAOFID")]
    pub id: i64,
    #[serde(rename = "SOF_CODIOF")]
    pub job_number: String,
    #[serde(rename = "SOF_OPERAD")]
    pub operator_code: String,
    #[serde(rename = "SOF_DTINIC")]
    pub started_at: Option<String>,
    #[serde(rename = "SOF_DTAFIM")]
    pub ended_at: Option<String>,
    #[serde(rename = "SOF_QNTBOA")]
    pub quantity_good: Option<i64>,
    #[serde(rename = "SOF_ERROINTEGRA")]
    pub integration_error: Option<String>,
    #[serde(rename = "SOF_STATUS")]
    pub status: Option<ApontamentoStatus>,
}

/// Fields of a new open entry.
#[derive(Debug, Clone)]
pub struct NewOpenApontamento {
    pub job_number: String,
    pub operator_code: String,
    pub company_id: String,
    pub operation_code: String,
}

/// Fields of a fully-formed entry written in one step by the submit paths.
#[derive(Debug, Clone)]
pub struct CompletedApontamento {
    pub job_number: String,
    pub operator_code: String,
    pub company_id: String,
    pub operation_code: String,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub quantity_good: i64,
    pub integration_error: Option<String>,
}

/// Result of trying to open an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened(i64),
    AlreadyOpen(OpenApontamento),
}

/// Shift recorded for entries opened through the lifecycle.
const DEFAULT_SHIFT: i64 = 1;

const OPEN_ENTRY_SQL: &str = "SELECT id, job_number, started_at, operation_code
     FROM apontamentos
     WHERE operator_code = ?1
       AND company_id = ?2
       AND ended_at IS NULL
       AND deleted_at IS NULL";

fn find_open_on(
    conn: &Connection,
    operator_code: &str,
    company_id: &str,
) -> Result<Option<OpenApontamento>, DatabaseError> {
    Ok(conn
        .query_row(
            OPEN_ENTRY_SQL,
            params![operator_code, company_id],
            OpenApontamento::from_row,
        )
        .optional()?)
}

/// Returns the operator's open entry for a company, if any.
pub fn find_open(
    db: &Database,
    operator_code: &str,
    company_id: &str,
) -> Result<Option<OpenApontamento>, DatabaseError> {
    db.with_conn(|conn| find_open_on(conn, operator_code, company_id))
}

/// Inserts an open entry, or reports the entry already open for the same
/// operator and company.
///
/// The partial unique index on open entries makes the insert itself the
/// check, so two concurrent starts cannot both succeed.
pub fn insert_open(
    db: &Database,
    entry: &NewOpenApontamento,
    now: NaiveDateTime,
) -> Result<OpenOutcome, DatabaseError> {
    let now = format_timestamp(&now);
    db.with_transaction(|tx| {
        let inserted = tx.execute(
            "INSERT INTO apontamentos
                (job_number, operator_code, company_id, operation_code, shift_code,
                 started_at, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?6)",
            params![
                entry.job_number,
                entry.operator_code,
                entry.company_id,
                entry.operation_code,
                DEFAULT_SHIFT,
                now,
                ApontamentoStatus::Open.as_str(),
            ],
        );

        match inserted {
            Ok(_) => Ok(OpenOutcome::Opened(tx.last_insert_rowid())),
            Err(e) => {
                let err = DatabaseError::from(e);
                if !err.is_unique_violation() {
                    return Err(err);
                }
                match find_open_on(tx, &entry.operator_code, &entry.company_id)? {
                    Some(open) => Ok(OpenOutcome::AlreadyOpen(open)),
                    None => Err(err),
                }
            }
        }
    })
}

/// Inserts a closed-style entry with explicit start and end.
pub fn insert_completed(
    db: &Database,
    entry: &CompletedApontamento,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    db.with_transaction(|tx| {
        tx.execute(
            "INSERT INTO apontamentos
                (job_number, operator_code, started_at, ended_at, operation_code,
                 quantity_good, company_id, integration_error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.job_number,
                entry.operator_code,
                format_timestamp(&entry.started_at),
                format_timestamp(&entry.ended_at),
                entry.operation_code,
                entry.quantity_good,
                entry.company_id,
                entry.integration_error,
                format_timestamp(&now),
            ],
        )?;
        Ok(tx.last_insert_rowid())
    })
}

/// Sets the end timestamp only. Returns the number of rows touched.
pub fn mark_paused(db: &Database, id: i64, now: NaiveDateTime) -> Result<usize, DatabaseError> {
    db.with_transaction(|tx| {
        let changed = tx.execute(
            "UPDATE apontamentos SET ended_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
            params![id, format_timestamp(&now)],
        )?;
        Ok(changed)
    })
}

/// Sets end timestamp, good quantity and closes the entry. Returns the
/// number of rows touched.
pub fn mark_finished(
    db: &Database,
    id: i64,
    quantity_good: i64,
    now: NaiveDateTime,
) -> Result<usize, DatabaseError> {
    db.with_transaction(|tx| {
        let changed = tx.execute(
            "UPDATE apontamentos
             SET ended_at = ?2, quantity_good = ?3, status = ?4
             WHERE id = ?1 AND deleted_at IS NULL",
            params![
                id,
                format_timestamp(&now),
                quantity_good,
                ApontamentoStatus::Closed.as_str()
            ],
        )?;
        Ok(changed)
    })
}

/// Finds an entry by id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ApontamentoRecord>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM apontamentos WHERE id = ?1 AND deleted_at IS NULL",
                params![id],
                ApontamentoRecord::from_row,
            )
            .optional()?)
    })
}

/// All entries of a job, most recent start first.
pub fn list_by_job(db: &Database, job_number: &str) -> Result<Vec<ApontamentoListRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, job_number, operator_code,
                    strftime('%d/%m/%Y %H:%M:%S', started_at) AS started_at,
                    strftime('%d/%m/%Y %H:%M:%S', ended_at) AS ended_at,
                    quantity_good, integration_error, status
             FROM apontamentos
             WHERE job_number = ?1
               AND deleted_at IS NULL
             ORDER BY apontamentos.started_at DESC, apontamentos.id DESC",
        )?;
        let rows = stmt
            .query_map(params![job_number], |row| {
                let status: Option<String> = row.get("status")?;
                Ok(ApontamentoListRow {
                    id: row.get("id")?,
                    job_number: row.get("job_number")?,
                    operator_code: row.get("operator_code")?,
                    started_at: row.get("started_at")?,
                    ended_at: row.get("ended_at")?,
                    quantity_good: row.get("quantity_good")?,
                    integration_error: row.get("integration_error")?,
                    status: status.as_deref().and_then(ApontamentoStatus::parse),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
