//! Caller identity extractor.
//!
//! Identification is carried in two optional headers:
//! - `X-User-Id` -- ownership scope; defaults to the anonymous sentinel.
//! - `X-Session-Id` -- thread scope; callers wanting continuity must
//!   capture the session id echoed in the optimize response and resend it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use promptsmith_types::conversation::ANONYMOUS_USER;

const USER_ID_HEADER: &str = "x-user-id";
const SESSION_ID_HEADER: &str = "x-session-id";

/// Caller identity resolved from request headers.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: String,
    /// None when the caller did not supply a session; the optimize
    /// handler starts a fresh thread, the history handler queries across
    /// all of the user's sessions.
    pub session_id: Option<String>,
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            user_id: header(USER_ID_HEADER).unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            session_id: header(SESSION_ID_HEADER),
        })
    }
}
