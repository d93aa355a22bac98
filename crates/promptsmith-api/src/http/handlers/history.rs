//! Conversation history endpoint.
//!
//! GET /api/history?limit=N
//!
//! Scoped by the `X-User-Id` and (optionally) `X-Session-Id` headers;
//! without a session id the user's most recent records across all
//! sessions are returned.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use promptsmith_types::llm::Message;

use crate::http::error::AppError;
use crate::http::extractors::identity::CallerIdentity;
use crate::http::response::{ApiMeta, ApiResponse};
use crate::state::AppState;

/// Query parameters for history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum turn-groups to return; defaults to the configured page size.
    pub limit: Option<u32>,
}

/// One turn-group in the history response.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

/// Response payload for the history endpoint.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub count: usize,
}

/// GET /api/history -- list recent turn-groups, newest first.
pub async fn history(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryResponse>>, AppError> {
    let limit = query.limit.unwrap_or(state.config.history_page_turns);

    let records = state
        .conversations
        .fetch_history(&identity.user_id, identity.session_id.as_deref(), limit)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let history: Vec<HistoryEntry> = records
        .into_iter()
        .map(|r| HistoryEntry {
            messages: r.messages,
            created_at: r.created_at,
        })
        .collect();

    let response = HistoryResponse {
        user_id: identity.user_id,
        session_id: identity.session_id,
        count: history.len(),
        history,
    };

    Ok(Json(ApiResponse::success(response, ApiMeta::new())))
}
