//! Error types for index decode and search operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// Failure at the fetch boundary
    #[error(transparent)]
    Core(#[from] galdex_core::Error),

    /// Structural violation in a remote buffer
    #[error("malformed data: {0}")]
    Malformed(String),
}

impl IndexError {
    /// Create a malformed-data error
    pub fn malformed(msg: impl Into<String>) -> Self {
        IndexError::Malformed(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
