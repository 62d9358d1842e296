//! Operator identity lookup.

use crate::db::operator_repo::{self, Operator};
use crate::db::Database;
use crate::error::{Result, ShopfloorError};
use crate::requests::validate_operator_code;

/// Resolves an operator by ERP code; `NotFound` when unknown.
pub fn lookup(db: &Database, code: &str) -> Result<Operator> {
    let code = validate_operator_code(Some(code))?;
    operator_repo::find_by_code(db, code)?
        .ok_or_else(|| ShopfloorError::not_found(format!("Operator {} not found", code)))
}
