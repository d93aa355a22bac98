//! Prompt optimization endpoint.
//!
//! POST /api/optimize
//!
//! Body: `{ "message": "..." }`. Identity comes from the `X-User-Id` and
//! `X-Session-Id` headers; a missing session id starts a fresh thread and
//! the generated id is echoed back so the caller can continue it.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use promptsmith_types::conversation::RecordId;
use promptsmith_types::error::OptimizeError;

use crate::http::error::AppError;
use crate::http::extractors::identity::CallerIdentity;
use crate::http::response::{ApiMeta, ApiResponse};
use crate::state::AppState;

/// Request body for the optimize endpoint.
#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    /// The prompt to optimize. Optional so that a missing field maps to
    /// the service's invalid-input error instead of a rejection from the
    /// JSON extractor.
    pub message: Option<String>,
}

/// Response payload for a successful optimization.
#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub original_prompt: String,
    pub optimized_prompt: String,
    /// Echoed (or freshly generated) session id for thread continuity.
    pub session_id: String,
    pub has_history: bool,
    pub history_count: usize,
}

/// POST /api/optimize -- optimize a prompt with conversational context.
pub async fn optimize(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(body): Json<OptimizeRequest>,
) -> Result<Json<ApiResponse<OptimizeResponse>>, AppError> {
    let optimizer = state
        .optimizer
        .as_ref()
        .ok_or(AppError::ProviderNotConfigured)?;

    let message = body.message.ok_or_else(|| {
        AppError::Optimize(OptimizeError::InvalidInput(
            "missing 'message' field".to_string(),
        ))
    })?;

    let session_id = identity
        .session_id
        .unwrap_or_else(|| RecordId::generate().to_string());

    let outcome = optimizer
        .optimize(&identity.user_id, &session_id, &message)
        .await?;

    let metadata = ApiMeta::new().with_model(&outcome.model);
    let response = OptimizeResponse {
        original_prompt: message,
        optimized_prompt: outcome.optimized_prompt,
        session_id,
        has_history: outcome.history_count > 0,
        history_count: outcome.history_count,
    };

    Ok(Json(ApiResponse::success(response, metadata)))
}
