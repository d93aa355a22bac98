//! LlmProvider trait definition.
//!
//! The opaque generation capability: ordered messages in, text out.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).
//! Implementations live in promptsmith-infra (e.g., `OpenAiProvider`).

use promptsmith_types::llm::{GenerationRequest, LlmError};

/// Trait for generation provider backends.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Model this provider sends requests to.
    fn model(&self) -> &str;

    /// Send a completion request and receive the generated text.
    ///
    /// May fail with network, timeout, or rate-limit conditions; any such
    /// failure is fatal to the optimize request and no record is written.
    fn complete(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}
