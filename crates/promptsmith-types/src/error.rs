use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in
/// promptsmith-core).
///
/// All variants are non-fatal to the request path: persistence is a
/// side-channel of the optimize flow, never a blocking dependency.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Errors from the optimize flow that are visible to the caller.
///
/// Only these two conditions affect the caller-visible outcome; storage
/// faults are logged and swallowed on the request path.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::DuplicateKey("id '1-abc' exists".to_string());
        assert_eq!(err.to_string(), "duplicate key: id '1-abc' exists");
    }

    #[test]
    fn test_optimize_error_from_llm_error() {
        let err: OptimizeError = LlmError::RateLimited.into();
        assert!(matches!(err, OptimizeError::Generation(LlmError::RateLimited)));
    }

    #[test]
    fn test_invalid_input_display() {
        let err = OptimizeError::InvalidInput("missing message field".to_string());
        assert_eq!(err.to_string(), "invalid input: missing message field");
    }
}
