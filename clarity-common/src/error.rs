//! Common error types for the clarity grader

use thiserror::Error;

/// Common result type for clarity grader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading configuration and preparing the root folder
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
