//! Shared state handed to every handler.

use std::sync::Arc;

use shopfloor::config::DownloadConfig;
use shopfloor::Database;

use crate::error::ApiError;

pub struct AppState {
    pub db: Database,
    pub downloads: DownloadConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, downloads: DownloadConfig) -> SharedState {
        Arc::new(Self { db, downloads })
    }

    /// Runs a blocking database operation off the async runtime.
    pub async fn run<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&AppState) -> shopfloor::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        let result = tokio::task::spawn_blocking(move || f(state.as_ref())).await?;
        Ok(result?)
    }
}
