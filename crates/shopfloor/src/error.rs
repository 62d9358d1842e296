use std::path::PathBuf;
use thiserror::Error;

use crate::db::apontamento_repo::OpenApontamento;
use crate::db::DatabaseError;

/// Machine-readable code reported when an operator already has an open entry.
pub const CODE_APONTAMENTO_OPEN: &str = "APONTAMENTO_ABERTO";

#[derive(Error, Debug)]
pub enum ShopfloorError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// The requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operator already has an open apontamento for this company.
    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
        open: OpenApontamento,
    },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ShopfloorError {
    pub fn validation(message: impl Into<String>) -> Self {
        ShopfloorError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ShopfloorError::NotFound(message.into())
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ShopfloorError::Validation(_) => 400,
            ShopfloorError::NotFound(_) => 404,
            ShopfloorError::Conflict { .. } => 409,
            ShopfloorError::Database(_) | ShopfloorError::Config(_) => 500,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnv { name: String, value: String },
}

pub type Result<T> = std::result::Result<T, ShopfloorError>;
