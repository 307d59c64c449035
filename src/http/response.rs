//! Handler error responses.
//!
//! Every handler failure becomes a JSON body `{"error": "..."}` with a
//! matching status code.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to clients by route handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range query parameter.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Failure deliberately triggered by `/error`.
    #[error("intentional failure")]
    IntentionalFailure,

    #[error("not found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            AppError::IntentionalFailure | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
