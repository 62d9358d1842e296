//! Schema migrations.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs together with its bookkeeping row in one transaction, so a failed
//! migration leaves no trace.

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_erp_tables",
        sql: include_str!("sql/001_create_erp_tables.sql"),
    },
    Migration {
        version: 2,
        description: "create_apontamentos_table",
        sql: include_str!("sql/002_create_apontamentos.sql"),
    },
    Migration {
        version: 3,
        description: "unique_open_apontamento_per_operator",
        sql: include_str!("sql/003_unique_open_apontamento.sql"),
    },
];

const CREATE_TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version     INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);";

/// Brings the schema up to the latest version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(CREATE_TRACKING_TABLE)?;

    let applied: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        log::info!(
            "Applying schema v{} ({})",
            migration.version,
            migration.description
        );
        apply(conn, migration)?;
    }

    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let batch = format!(
        "BEGIN;\n{}\nINSERT INTO _migrations (version, description) VALUES ({}, '{}');\nCOMMIT;",
        migration.sql, migration.version, migration.description
    );

    conn.execute_batch(&batch).map_err(|e| {
        // A failed statement leaves the BEGIN open.
        if !conn.is_autocommit() {
            if let Err(rollback) = conn.execute_batch("ROLLBACK;") {
                log::warn!("Rollback after failed migration failed: {}", rollback);
            }
        }
        DatabaseError::Migration {
            version: migration.version,
            reason: e.to_string(),
        }
    })
}
