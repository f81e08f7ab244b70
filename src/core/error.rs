//! Error taxonomy for the scoring core
//!
//! Most plumbing propagates `anyhow::Result`. These variants name the
//! failures a caller may want to match on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    /// Referenced fact or entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed query or identifier
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Embedding provider missing, failing or too slow
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A batch write failed and was rolled back
    #[error("update rolled back: {0}")]
    Inconsistent(String),
}
