//! Application error type mapping to HTTP status codes and the envelope
//! format.
//!
//! Only invalid input and generation failure reach this layer from the
//! optimize flow; storage faults are swallowed upstream and never map to
//! an HTTP error on that path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use promptsmith_types::error::OptimizeError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Caller-visible optimize failures (bad input, generation fault).
    Optimize(OptimizeError),
    /// The generation provider is not configured (no API key).
    ProviderNotConfigured,
    /// Generic internal error.
    Internal(String),
}

impl From<OptimizeError> for AppError {
    fn from(e: OptimizeError) -> Self {
        AppError::Optimize(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Optimize(OptimizeError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            // Surface a generic message; the provider detail goes to the log.
            AppError::Optimize(OptimizeError::Generation(e)) => {
                tracing::error!(error = %e, "Generation failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "generation failed, please retry".to_string(),
                )
            }
            AppError::ProviderNotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "OPENAI_API_KEY not configured".to_string(),
            ),
            AppError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}
