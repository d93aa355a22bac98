//! Shared domain types for Promptsmith.
//!
//! This crate contains the core domain types used across the Promptsmith
//! service: conversation records, LLM messages, configuration, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, rand, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
