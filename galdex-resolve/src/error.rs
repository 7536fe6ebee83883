//! Error types for query resolution

use thiserror::Error;

/// Resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Failure at the fetch boundary
    #[error(transparent)]
    Core(#[from] galdex_core::Error),

    /// Index decode or search failure
    #[error(transparent)]
    Index(#[from] galdex_index::IndexError),

    /// Caller-supplied query violates a precondition
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Structural violation in a fetched buffer at this layer
    #[error("malformed data: {0}")]
    Malformed(String),

    /// Directive document failed to parse into a usable whole
    #[error("malformed directives: {0}")]
    MalformedDirectives(String),

    /// Subdomain resolution used before a successful synchronize
    #[error("subdomain directives not synchronized")]
    NotSynchronized,
}

impl ResolveError {
    /// Create an invalid-query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        ResolveError::InvalidQuery(msg.into())
    }

    /// Create a malformed-data error
    pub fn malformed(msg: impl Into<String>) -> Self {
        ResolveError::Malformed(msg.into())
    }

    /// Create a malformed-directives error
    pub fn malformed_directives(msg: impl Into<String>) -> Self {
        ResolveError::MalformedDirectives(msg.into())
    }
}

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, ResolveError>;
