//! Error types for Citations.

use thiserror::Error;

/// Core error type for Citations domain values.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using the core Error.
pub type Result<T> = std::result::Result<T, Error>;
