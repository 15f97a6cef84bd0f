use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::ai::AiError;

/// Boundary error for every handler. Detailed upstream diagnostics are
/// logged server-side; the wire only ever carries the generic envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("csv import rejected")]
    CsvRejected(Vec<String>),
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Ai(#[from] AiError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "authentication required" }),
            ),
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::CsvRejected(rows) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "csv import rejected", "rows": rows }),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not found" })),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal error" }))
            }
            ApiError::Ai(err) => {
                tracing::error!(error = %err, "AI service call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}
