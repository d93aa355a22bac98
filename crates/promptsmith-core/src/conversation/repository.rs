//! ConversationRepository trait definition.
//!
//! The single-table, append-mostly conversation log. Implementations live
//! in promptsmith-infra (e.g., `SqliteConversationRepository`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use chrono::{DateTime, Utc};

use promptsmith_types::conversation::ConversationRecord;
use promptsmith_types::error::RepositoryError;

/// Repository trait for conversation record persistence.
///
/// Every operation is an independently atomic single statement against
/// the storage medium; no multi-statement transactions are assumed.
pub trait ConversationRepository: Send + Sync {
    /// Persist a new record.
    ///
    /// Fails with [`RepositoryError::DuplicateKey`] when the id already
    /// exists (the caller retries with a freshly generated id) and
    /// [`RepositoryError::Unavailable`] when the medium is unreachable.
    fn insert(
        &self,
        record: &ConversationRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Fetch up to `limit` records for a user (and session, if given),
    /// ordered by `created_at` descending. Zero matches is an empty vec,
    /// never an error.
    ///
    /// A stored payload that fails to decode is skipped and logged, not
    /// surfaced: history is best-effort context, not authoritative state.
    fn query_recent(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationRecord>, RepositoryError>> + Send;

    /// Delete all records with `created_at` strictly before `cutoff`.
    /// Returns the number of rows removed; nothing matching is not an
    /// error. Safe to run concurrently with inserts since deletion is a
    /// time predicate and a fresh record is never in the deletable past.
    fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
