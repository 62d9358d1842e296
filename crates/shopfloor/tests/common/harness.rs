#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use shopfloor::config::{DatabaseConfig, DownloadConfig};
use shopfloor::Database;

/// Isolated environment: a temp directory holding the database file and a
/// STEP file root.
pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub db_path: PathBuf,
    pub step_root: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_pool_size(4)
    }

    pub fn with_pool_size(pool_size: u32) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("data").join("shopfloor.db");
        let step_root = temp_dir.path().join("step");
        std::fs::create_dir_all(&step_root).expect("Failed to create step root");

        let db = Database::open(&DatabaseConfig {
            path: db_path.clone(),
            pool_size,
            busy_timeout_ms: 5000,
        })
        .expect("Failed to open test database");

        Self {
            temp_dir,
            db,
            db_path,
            step_root,
        }
    }

    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn downloads(&self) -> DownloadConfig {
        DownloadConfig {
            step_root: Some(self.step_root.clone()),
        }
    }

    /// Writes a STEP file under the step root and returns its absolute path.
    pub fn write_step_file(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.step_root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create step dir");
        }
        std::fs::write(&path, contents).expect("Failed to write step file");
        path
    }

    /// Reopens the same database file with a fresh pool.
    pub fn reopen(&self) -> Database {
        Database::open(&DatabaseConfig {
            path: self.db_path.clone(),
            pool_size: 2,
            busy_timeout_ms: 5000,
        })
        .expect("Failed to reopen test database")
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.db
            .with_conn(|conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
            .expect("count query failed")
    }
}
