//! Conversation service orchestrating history retrieval, exchange
//! persistence, and the retention sweep.
//!
//! Generic over [`ConversationRepository`] to maintain clean architecture
//! (promptsmith-core never depends on promptsmith-infra).

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use promptsmith_types::conversation::{ConversationRecord, RecordId};
use promptsmith_types::error::RepositoryError;
use promptsmith_types::llm::Message;

use crate::conversation::repository::ConversationRepository;

/// Orchestrates conversation reads, writes, and retention.
pub struct ConversationService<R: ConversationRepository> {
    repo: R,
    /// Retention horizon in days.
    retention_days: i64,
    /// Probability of running a sweep after a successful write.
    sweep_probability: f64,
}

impl<R: ConversationRepository> ConversationService<R> {
    /// Create a new service with the given repository and retention policy.
    pub fn new(repo: R, retention_days: i64, sweep_probability: f64) -> Self {
        Self {
            repo,
            retention_days,
            sweep_probability,
        }
    }

    /// Fetch the most recent `limit` turn-groups for a user, newest first.
    ///
    /// A `session_id` scopes the query to one thread; without it, the
    /// user's most recent records across all sessions are returned.
    pub async fn fetch_history(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>, RepositoryError> {
        self.repo.query_recent(user_id, session_id, limit).await
    }

    /// Persist one finished exchange as a new record.
    ///
    /// Builds the two-element turn-group (user message, assistant reply),
    /// generates an id, and inserts. An id collision is retried once with
    /// a fresh id; any further failure propagates to the caller, which on
    /// the request path logs it and moves on.
    pub async fn record_exchange(
        &self,
        user_id: &str,
        session_id: &str,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<ConversationRecord, RepositoryError> {
        let messages = vec![
            Message::user(user_message),
            Message::assistant(assistant_message),
        ];

        let now = Utc::now();
        let mut record = ConversationRecord {
            id: RecordId::generate(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            messages,
            created_at: now,
            updated_at: now,
        };

        match self.repo.insert(&record).await {
            Err(RepositoryError::DuplicateKey(_)) => {
                record.id = RecordId::generate();
                self.repo.insert(&record).await?;
                Ok(record)
            }
            Err(e) => Err(e),
            Ok(()) => Ok(record),
        }
    }

    /// Delete all records older than the retention horizon.
    ///
    /// Idempotent: a second sweep with no intervening writes deletes
    /// nothing and returns 0.
    pub async fn sweep(&self) -> Result<u64, RepositoryError> {
        let cutoff = Utc::now() - Duration::days(self.retention_days);
        let removed = self.repo.delete_older_than(cutoff).await?;
        if removed > 0 {
            info!(removed, retention_days = self.retention_days, "Retention sweep removed records");
        } else {
            debug!("Retention sweep found nothing to remove");
        }
        Ok(removed)
    }

    /// Probabilistically trigger a sweep after a successful write.
    ///
    /// A lightweight substitute for a scheduled background job: each write
    /// path rolls the dice instead of relying on persistent background
    /// execution. Fire-and-forget -- failures are logged, never propagated
    /// to the request path. Concurrent sweeps are idempotent because
    /// deletion is a time predicate.
    pub async fn maybe_sweep(&self) {
        if rand::random::<f64>() >= self.sweep_probability {
            return;
        }
        if let Err(e) = self.sweep().await {
            warn!(error = %e, "Retention sweep failed");
        }
    }
}
