//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `promptsmith-core` using sqlx
//! with split read/write pools. One row per exchange; timestamps are unix
//! milliseconds so the retention cutoff is a plain integer comparison.

use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::warn;

use promptsmith_core::conversation::ConversationRepository;
use promptsmith_types::conversation::ConversationRecord;
use promptsmith_types::error::RepositoryError;
use promptsmith_types::llm::Message;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    user_id: String,
    session_id: String,
    messages: String,
    created_at: i64,
    updated_at: i64,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            session_id: row.try_get("session_id")?,
            messages: row.try_get("messages")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Decode the row into a domain record.
    ///
    /// Returns an error string (not a `RepositoryError`) because a single
    /// undecodable row is dropped from the result set, never surfaced.
    fn into_record(self) -> Result<ConversationRecord, String> {
        let messages: Vec<Message> = serde_json::from_str(&self.messages)
            .map_err(|e| format!("invalid messages JSON: {e}"))?;

        let created_at = from_millis(self.created_at)?;
        let updated_at = from_millis(self.updated_at)?;

        Ok(ConversationRecord {
            id: self.id.into(),
            user_id: self.user_id,
            session_id: self.session_id,
            messages,
            created_at,
            updated_at,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| format!("timestamp out of range: {ms}"))
}

fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::Database(db) if db.message().contains("UNIQUE") => {
            RepositoryError::DuplicateKey(db.message().to_string())
        }
        e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
            RepositoryError::Unavailable(e.to_string())
        }
        sqlx::Error::Io(io) => RepositoryError::Unavailable(io.to_string()),
        other => RepositoryError::Query(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// ConversationRepository impl
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn insert(&self, record: &ConversationRecord) -> Result<(), RepositoryError> {
        let messages_json = serde_json::to_string(&record.messages)
            .map_err(|e| RepositoryError::Query(format!("serialize messages: {e}")))?;

        sqlx::query(
            r#"INSERT INTO conversations
               (id, user_id, session_id, messages, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.as_str())
        .bind(&record.user_id)
        .bind(&record.session_id)
        .bind(&messages_json)
        .bind(record.created_at.timestamp_millis())
        .bind(record.updated_at.timestamp_millis())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn query_recent(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>, RepositoryError> {
        let rows = match session_id {
            Some(session) => {
                sqlx::query(
                    r#"SELECT * FROM conversations
                       WHERE user_id = ? AND session_id = ?
                       ORDER BY created_at DESC
                       LIMIT ?"#,
                )
                .bind(user_id)
                .bind(session)
                .bind(limit as i64)
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query(
                    r#"SELECT * FROM conversations
                       WHERE user_id = ?
                       ORDER BY created_at DESC
                       LIMIT ?"#,
                )
                .bind(user_id)
                .bind(limit as i64)
                .fetch_all(&self.pool.reader)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw = ConversationRow::from_row(row).map_err(map_sqlx_error)?;
            let id = raw.id.clone();
            match raw.into_record() {
                Ok(record) => records.push(record),
                // One bad payload must not abort the rest of the history.
                Err(reason) => {
                    warn!(record_id = %id, %reason, "Skipping undecodable conversation record");
                }
            }
        }
        Ok(records)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM conversations WHERE created_at < ?")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use promptsmith_types::conversation::RecordId;

    async fn test_repo() -> SqliteConversationRepository {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        SqliteConversationRepository::new(DatabasePool::new(&url).await.unwrap())
    }

    fn make_record(user: &str, session: &str, text: &str, age_days: i64) -> ConversationRecord {
        let at = Utc::now() - Duration::days(age_days);
        ConversationRecord {
            id: RecordId::generate(),
            user_id: user.to_string(),
            session_id: session.to_string(),
            messages: vec![Message::user(text), Message::assistant("reply")],
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_query_roundtrip() {
        let repo = test_repo().await;

        let record = make_record("u1", "s1", "Hi", 0);
        repo.insert(&record).await.unwrap();

        let records = repo.query_recent("u1", Some("s1"), 5).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, record.id);
        assert_eq!(records[0].messages[0].content, "Hi");
        assert_eq!(records[0].messages[1].content, "reply");
        // Millisecond storage resolution.
        assert_eq!(
            records[0].created_at.timestamp_millis(),
            record.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_query_zero_matches_is_empty() {
        let repo = test_repo().await;
        let records = repo.query_recent("nobody", None, 10).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_query_ordered_descending_with_limit() {
        let repo = test_repo().await;

        repo.insert(&make_record("u1", "s1", "oldest", 3)).await.unwrap();
        repo.insert(&make_record("u1", "s1", "middle", 2)).await.unwrap();
        repo.insert(&make_record("u1", "s1", "newest", 1)).await.unwrap();

        let records = repo.query_recent("u1", Some("s1"), 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].messages[0].content, "newest");
        assert_eq!(records[1].messages[0].content, "middle");
    }

    #[tokio::test]
    async fn test_user_isolation() {
        let repo = test_repo().await;

        repo.insert(&make_record("u1", "s1", "mine", 0)).await.unwrap();
        repo.insert(&make_record("u2", "s1", "theirs", 0)).await.unwrap();

        let records = repo.query_recent("u1", None, 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_session_scoping() {
        let repo = test_repo().await;

        repo.insert(&make_record("u1", "s1", "thread-1", 0)).await.unwrap();
        repo.insert(&make_record("u1", "s2", "thread-2", 0)).await.unwrap();

        let scoped = repo.query_recent("u1", Some("s1"), 10).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].session_id, "s1");

        let all = repo.query_recent("u1", None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let repo = test_repo().await;

        let record = make_record("u1", "s1", "Hi", 0);
        repo.insert(&record).await.unwrap();

        let mut duplicate = make_record("u1", "s1", "again", 0);
        duplicate.id = record.id.clone();
        let err = repo.insert(&duplicate).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_delete_older_than_respects_horizon() {
        let repo = test_repo().await;

        repo.insert(&make_record("u1", "s1", "expired", 31)).await.unwrap();
        repo.insert(&make_record("u1", "s1", "fresh", 1)).await.unwrap();

        let cutoff = Utc::now() - Duration::days(30);
        let removed = repo.delete_older_than(cutoff).await.unwrap();
        assert_eq!(removed, 1);

        let records = repo.query_recent("u1", None, 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].messages[0].content, "fresh");
    }

    #[tokio::test]
    async fn test_delete_older_than_idempotent() {
        let repo = test_repo().await;

        repo.insert(&make_record("u1", "s1", "expired", 40)).await.unwrap();

        let cutoff = Utc::now() - Duration::days(30);
        assert_eq!(repo.delete_older_than(cutoff).await.unwrap(), 1);
        assert_eq!(repo.delete_older_than(cutoff).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_payload_skipped_not_fatal() {
        let repo = test_repo().await;

        repo.insert(&make_record("u1", "s1", "good", 0)).await.unwrap();

        // Corrupt row written behind the repository's back.
        sqlx::query(
            "INSERT INTO conversations (id, user_id, session_id, messages, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind("0-corrupted")
        .bind("u1")
        .bind("s1")
        .bind("not json at all")
        .bind(Utc::now().timestamp_millis())
        .bind(Utc::now().timestamp_millis())
        .execute(&repo.pool.writer)
        .await
        .unwrap();

        let records = repo.query_recent("u1", Some("s1"), 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].messages[0].content, "good");
    }
}
