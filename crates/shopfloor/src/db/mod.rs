//! Data access gateway.
//!
//! Every operation checks a connection out of an `r2d2` pool, runs its
//! statements and hands the connection back when the guard drops, on success
//! and on failure alike. Writes go through [`Database::with_transaction`],
//! which commits on `Ok` and rolls back on `Err`.

use std::path::PathBuf;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::config::DatabaseConfig;

pub mod apontamento_repo;
pub mod error;
pub mod migrations;
pub mod operator_repo;
pub mod sequencing_repo;

pub use error::DatabaseError;

/// Timestamp layout used for every date column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pooled database handle.
///
/// Cloning is cheap (the pool is reference counted internally).
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens (or creates) the database described by `config` and runs all
    /// pending migrations.
    pub fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = config.path.as_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
            conn.pragma_update(None, "foreign_keys", "ON")
        });

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(busy_timeout)
            .build(manager)?;

        let db = Self { pool };
        db.with_conn(migrations::run_all)?;

        log::info!(
            "Database opened at {} (pool size {})",
            path.display(),
            config.pool_size
        );

        Ok(db)
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    ///
    /// The pool holds a single connection that is never recycled, so every
    /// checkout sees the same in-memory schema.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys=ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .max_lifetime(None)
            .idle_timeout(None)
            .build(manager)?;

        let db = Self { pool };
        db.with_conn(migrations::run_all)?;
        Ok(db)
    }

    /// Runs `f` against a pooled connection. Used for reads.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.pool.get()?;
        f(&conn)
    }

    /// Runs `f` inside an IMMEDIATE transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and is rolled back
    /// otherwise, before the error reaches the caller.
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let mut conn = self.pool.get().map_err(DatabaseError::from)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DatabaseError::from)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(DatabaseError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::warn!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Cheap liveness probe.
    pub fn ping(&self) -> Result<(), DatabaseError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
            Ok(())
        })
    }
}

/// Returns the canonical database path: `~/.shopfloor/data/shopfloor.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".shopfloor").join("data").join("shopfloor.db"))
}

/// Formats a timestamp the way it is stored.
pub fn format_timestamp(ts: &chrono::NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
