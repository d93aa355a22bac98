//! Optimizer service: the per-request control flow.
//!
//! retrieve history -> assemble context -> generate -> persist exchange
//! -> (probabilistically) sweep. History retrieval and persistence are
//! best-effort side channels; only invalid input and generation failure
//! reach the caller.

use tracing::warn;

use promptsmith_types::config::ServiceConfig;
use promptsmith_types::error::OptimizeError;
use promptsmith_types::llm::GenerationRequest;

use crate::conversation::repository::ConversationRepository;
use crate::conversation::service::ConversationService;
use crate::conversation::assemble_context;
use crate::llm::provider::LlmProvider;

/// System instructions for the prompt-optimizer agent.
///
/// The agent's sole job is to improve the user's prompt, never to carry
/// out the task the prompt describes.
pub const OPTIMIZER_INSTRUCTIONS: &str = "\
You are an expert prompt engineer. Your only job is to optimize the \
user's prompt -- never to perform the task it describes.

When the user submits a prompt (e.g. \"translate this passage for me\"):
1. Analyze the weaknesses of the original prompt.
2. Provide two optimized versions of the prompt.
3. Explain why the changes make the prompt more effective.

Output format:
- Original prompt analysis
- Optimized prompt (version 1 and version 2)
- Key improvements
- Usage suggestions";

/// Result of a successful optimize call.
#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    /// The generated, optimized prompt text.
    pub optimized_prompt: String,
    /// Turn-groups of prior history that primed this generation.
    pub history_count: usize,
    /// Model that produced the text.
    pub model: String,
}

/// Orchestrates one optimize request end to end.
///
/// Generic over the repository and provider traits so the whole flow is
/// testable without SQLite or a live model.
pub struct OptimizerService<R: ConversationRepository, P: LlmProvider> {
    conversations: ConversationService<R>,
    provider: P,
    config: ServiceConfig,
}

impl<R: ConversationRepository, P: LlmProvider> OptimizerService<R, P> {
    pub fn new(conversations: ConversationService<R>, provider: P, config: ServiceConfig) -> Self {
        Self {
            conversations,
            provider,
            config,
        }
    }

    /// Access the conversation service (history endpoint, CLI).
    pub fn conversations(&self) -> &ConversationService<R> {
        &self.conversations
    }

    /// Optimize a prompt within the caller's (user, session) thread.
    ///
    /// Ordering guarantee: persistence happens strictly after generation
    /// completes, so a persisted record never exists for a failed
    /// generation. Storage faults on either the read or write side are
    /// logged and swallowed; the generated text is returned regardless.
    pub async fn optimize(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<OptimizeOutcome, OptimizeError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(OptimizeError::InvalidInput(
                "message must be a non-empty string".to_string(),
            ));
        }

        // Best-effort: a failed retrieval degrades to an empty context.
        let history = match self
            .conversations
            .fetch_history(user_id, Some(session_id), self.config.context_turns)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, user_id, session_id, "History retrieval failed, continuing without context");
                Vec::new()
            }
        };

        let request = GenerationRequest {
            messages: assemble_context(&history, message),
            system: Some(OPTIMIZER_INSTRUCTIONS.to_string()),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
        };

        let optimized = self.provider.complete(&request).await?;

        match self
            .conversations
            .record_exchange(user_id, session_id, message, &optimized)
            .await
        {
            Ok(_) => self.conversations.maybe_sweep().await,
            Err(e) => {
                warn!(error = %e, user_id, session_id, "Failed to persist exchange, returning response anyway");
            }
        }

        Ok(OptimizeOutcome {
            optimized_prompt: optimized,
            history_count: history.len(),
            model: self.provider.model().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use promptsmith_types::conversation::ConversationRecord;
    use promptsmith_types::error::RepositoryError;
    use promptsmith_types::llm::{LlmError, Message, MessageRole};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryRepo {
        rows: Mutex<Vec<ConversationRecord>>,
        unavailable: bool,
    }

    impl ConversationRepository for MemoryRepo {
        async fn insert(&self, record: &ConversationRecord) -> Result<(), RepositoryError> {
            if self.unavailable {
                return Err(RepositoryError::Unavailable("medium unreachable".to_string()));
            }
            self.rows.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn query_recent(
            &self,
            user_id: &str,
            session_id: Option<&str>,
            limit: u32,
        ) -> Result<Vec<ConversationRecord>, RepositoryError> {
            if self.unavailable {
                return Err(RepositoryError::Unavailable("medium unreachable".to_string()));
            }
            let rows = self.rows.lock().unwrap();
            let mut matched: Vec<ConversationRecord> = rows
                .iter()
                .filter(|r| r.user_id == user_id)
                .filter(|r| session_id.is_none_or(|s| r.session_id == s))
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            matched.truncate(limit as usize);
            Ok(matched)
        }

        async fn delete_older_than(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<u64, RepositoryError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.created_at >= cutoff);
            Ok((before - rows.len()) as u64)
        }
    }

    /// Provider that echoes the context it was handed, or fails.
    struct FakeProvider {
        fail: bool,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl FakeProvider {
        fn ok() -> Self {
            Self {
                fail: false,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request.messages.clone());
            if self.fail {
                return Err(LlmError::Provider {
                    message: "model timed out".to_string(),
                });
            }
            Ok(format!("optimized: {}", request.messages.last().unwrap().content))
        }
    }

    fn optimizer(repo: MemoryRepo, provider: FakeProvider) -> OptimizerService<MemoryRepo, FakeProvider> {
        let config = ServiceConfig::default();
        let conversations = ConversationService::new(repo, config.retention_days, 0.0);
        OptimizerService::new(conversations, provider, config)
    }

    #[tokio::test]
    async fn test_optimize_persists_exchange_and_returns_text() {
        let svc = optimizer(MemoryRepo::default(), FakeProvider::ok());

        let outcome = svc.optimize("u1", "s1", "translate this").await.unwrap();
        assert_eq!(outcome.optimized_prompt, "optimized: translate this");
        assert_eq!(outcome.history_count, 0);
        assert_eq!(outcome.model, "fake-model");

        let history = svc
            .conversations()
            .fetch_history("u1", Some("s1"), 5)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].messages[0].content, "translate this");
        assert_eq!(history[0].messages[1].content, "optimized: translate this");
    }

    #[tokio::test]
    async fn test_optimize_rejects_empty_message_before_generation() {
        let svc = optimizer(MemoryRepo::default(), FakeProvider::ok());

        let err = svc.optimize("u1", "s1", "   ").await.unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));
        // Validation happens before the provider is touched.
        assert!(svc.provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_optimize_feeds_prior_turns_in_chronological_order() {
        let svc = optimizer(MemoryRepo::default(), FakeProvider::ok());

        svc.optimize("u1", "s1", "first").await.unwrap();
        let outcome = svc.optimize("u1", "s1", "second").await.unwrap();
        assert_eq!(outcome.history_count, 1);

        let seen = svc.provider.seen.lock().unwrap();
        let context = seen.last().unwrap();
        let contents: Vec<&str> = context.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["first", "optimized: first", "second"]
        );
        assert_eq!(context[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_generation_failure_writes_no_record() {
        let svc = optimizer(MemoryRepo::default(), FakeProvider::failing());

        let err = svc.optimize("u1", "s1", "translate this").await.unwrap_err();
        assert!(matches!(err, OptimizeError::Generation(_)));

        let history = svc
            .conversations()
            .fetch_history("u1", Some("s1"), 5)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_storage_unavailable_still_returns_generated_text() {
        let repo = MemoryRepo {
            unavailable: true,
            ..Default::default()
        };
        let svc = optimizer(repo, FakeProvider::ok());

        // Both the history read and the persist fail; the caller still
        // gets the optimized text.
        let outcome = svc.optimize("u1", "s1", "translate this").await.unwrap();
        assert_eq!(outcome.optimized_prompt, "optimized: translate this");
        assert_eq!(outcome.history_count, 0);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_context() {
        let svc = optimizer(MemoryRepo::default(), FakeProvider::ok());

        svc.optimize("u1", "s1", "first").await.unwrap();
        let outcome = svc.optimize("u1", "s2", "other thread").await.unwrap();
        assert_eq!(outcome.history_count, 0);
    }
}
