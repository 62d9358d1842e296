//! Operator lookups.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operator {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "nome")]
    pub name: String,
}

/// Finds an operator by ERP code.
pub fn find_by_code(db: &Database, code: &str) -> Result<Option<Operator>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT erp_code, name FROM operators WHERE erp_code = ?1",
                params![code],
                |row| {
                    Ok(Operator {
                        code: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    })
}
