//! Common error types for the Uko client

use thiserror::Error;

/// Common result type for Uko operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the client crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scoring service answered with a body that cannot become a result
    #[error("Invalid server response format: {0}")]
    InvalidResponse(String),
}
