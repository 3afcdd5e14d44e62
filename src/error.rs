//! Error types for the authorization engine

use std::time::Duration;
use thiserror::Error;

/// Authorization engine errors
///
/// Persistence failures are propagated unchanged through [`AuthzError::Repository`];
/// the engine never substitutes a default allow or deny for a failed read.
/// Name lookups that find nothing are not errors — predicates simply return `false`.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Invalid input (entity validation, malformed permission keys)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Underlying repository failure, propagated unchanged
    #[error("Repository error: {0}")]
    Repository(String),

    /// Context resolution exceeded the configured deadline
    #[error("Authorization resolution timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
