//! Business logic for Promptsmith.
//!
//! Defines the repository and provider traits implemented in
//! promptsmith-infra, plus the conversation and optimizer services that
//! orchestrate them. This crate never depends on infrastructure.

pub mod conversation;
pub mod llm;
pub mod optimizer;
