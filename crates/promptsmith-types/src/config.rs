//! Service configuration for Promptsmith.
//!
//! Deserialized from `config.toml` in the data directory. Every field has
//! a default so a missing or partial file still yields a working config.

use serde::{Deserialize, Serialize};

/// Global service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Model handed to the generation provider.
    pub model: String,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Retention horizon in days; records older than this are swept.
    pub retention_days: i64,
    /// Probability of running a sweep after a successful write.
    pub sweep_probability: f64,
    /// Turn-groups of history retrieved to prime an optimize call.
    pub context_turns: u32,
    /// Turn-groups returned by the history endpoint per page.
    pub history_page_turns: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
            retention_days: 30,
            sweep_probability: 0.1,
            context_turns: 5,
            history_page_turns: 20,
        }
    }
}
