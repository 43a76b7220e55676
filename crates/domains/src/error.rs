//! # Error taxonomy
//!
//! Domain failures map one-to-one onto the response statuses the API
//! boundary produces. Storage backends report through [`StoreError`],
//! which folds into the domain taxonomy at the service layer.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Referenced resource absent (post, user)
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed input (empty comment, bad email, duplicate email, …)
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid bearer credential
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// Actor is not the resource owner
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Unexpected failure (storage down, contention exhausted, …)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}

/// A specialized Result type for domain logic.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failures reported by persistence adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness key was violated (e.g. a duplicate email).
    #[error("duplicate {0}")]
    Duplicate(String),

    /// The backend itself failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => DomainError::Validation(format!("{what} already exists")),
            StoreError::Backend(msg) => DomainError::Internal(msg),
        }
    }
}
