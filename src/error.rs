use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("route mismatch: {0}")]
    RouteMismatch(String),

    #[error("insufficient capacity: {0}")]
    InsufficientCapacity(String),

    #[error("trip {0} is already assigned")]
    AlreadyAssigned(u64),

    #[error("invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("no suitable driver for trip {0}")]
    NoSuitableDriver(u64),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_)
            | AppError::InvalidReference(_)
            | AppError::NoSuitableDriver(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RouteMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InsufficientCapacity(_)
            | AppError::AlreadyAssigned(_)
            | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
