//! Infrastructure implementations for Promptsmith.
//!
//! SQLite persistence (sqlx, split reader/writer WAL pools), the
//! OpenAI-compatible generation provider, and config file loading.

pub mod config;
pub mod llm;
pub mod sqlite;
