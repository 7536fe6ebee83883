//! Error types for galdex-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type shared by the fetch layer and the crates above it
#[derive(Error, Debug)]
pub enum Error {
    /// Transport returned a status other than 200 or 206
    #[error("request rejected for {path}: status {status}")]
    Rejected {
        /// Remote path the request was issued against
        path: String,
        /// HTTP status code the server answered with
        status: u16,
    },

    /// Transport-level failure (connect, timeout, body read)
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Create a rejected-request error
    pub fn rejected(path: impl Into<String>, status: u16) -> Self {
        Error::Rejected {
            path: path.into(),
            status,
        }
    }

    /// Create an I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }
}
