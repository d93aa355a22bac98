//! The prompt-optimizer agent: orchestrates history retrieval, context
//! assembly, generation, persistence, and the retention sweep for one
//! request.

pub mod service;

pub use service::{OptimizeOutcome, OptimizerService};
