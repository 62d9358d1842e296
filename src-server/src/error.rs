//! Maps the library error taxonomy onto JSON error envelopes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shopfloor::ShopfloorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Shopfloor(#[from] ShopfloorError),

    /// The request body or query string could not be decoded.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Request task failed: {}", err))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Shopfloor(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Shopfloor(ShopfloorError::Conflict {
                code,
                message,
                open,
            }) => json!({
                "success": false,
                "code": code,
                "message": message,
                "apontamento": open,
            }),
            ApiError::Shopfloor(e @ (ShopfloorError::Database(_) | ShopfloorError::Config(_))) => {
                tracing::error!(error = %e, "Request failed");
                json!({ "success": false, "error": "Database error" })
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                json!({ "success": false, "error": "Internal server error" })
            }
            other => json!({ "success": false, "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
