//! Conversation record types for Promptsmith.
//!
//! A [`ConversationRecord`] holds exactly one exchange (one user turn and
//! one assistant turn) -- not the whole thread. The whole thread is the
//! union of all records sharing a `session_id`, ordered by `created_at`.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::llm::Message;

/// Sentinel user id applied when the caller does not identify itself.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Length of the random alphanumeric suffix in a generated id.
const ID_SUFFIX_LEN: usize = 9;

/// Opaque unique identifier for a stored record or a session thread.
///
/// Construction is `{unix_millis}-{random alphanumeric suffix}`. Uniqueness
/// is probabilistic: same-millisecond calls from independent writers rely
/// on the suffix, and a collision surfaces as the store's primary-key
/// constraint, which the writer resolves by retrying with a fresh id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a new id from the current time and a random suffix.
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("{}-{suffix}", Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One persisted exchange, scoped to a user and a session.
///
/// Records are immutable once written; `updated_at` always equals
/// `created_at` in the current design. The only delete path is the
/// retention sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: RecordId,
    pub user_id: String,
    pub session_id: String,
    /// The turn-group: user message followed by the assistant reply.
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    #[test]
    fn test_record_id_shape() {
        let id = RecordId::generate();
        let (millis, suffix) = id.as_str().split_once('-').expect("timestamp-suffix form");
        assert!(millis.parse::<i64>().unwrap() > 0);
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_record_ids_distinct() {
        // Same-millisecond generation must still differ via the suffix.
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_serde_transparent() {
        let id = RecordId::from("123-abcdefghi".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"123-abcdefghi\"");
        let parsed: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_conversation_record_serialize() {
        let record = ConversationRecord {
            id: RecordId::generate(),
            user_id: ANONYMOUS_USER.to_string(),
            session_id: RecordId::generate().to_string(),
            messages: vec![
                Message {
                    role: MessageRole::User,
                    content: "Hi".to_string(),
                },
                Message {
                    role: MessageRole::Assistant,
                    content: "Hello".to_string(),
                },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"role\":\"assistant\""));
    }
}
