//! Error types for the Kagami library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`KagamiError`] enum defined here.
//!
//! # Examples
//!
//! ```
//! use kagami::error::{KagamiError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(KagamiError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Kagami operations.
///
/// It uses the `thiserror` crate for automatic `Error` trait implementation
/// and provides convenient constructor methods for creating specific error
/// types.
#[derive(Error, Debug)]
pub enum KagamiError {
    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors
    #[error("Index error: {0}")]
    Index(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Embedding-related errors (model loading, inference, image decoding)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with KagamiError.
pub type Result<T> = std::result::Result<T, KagamiError>;

impl KagamiError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        KagamiError::Index(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        KagamiError::Storage(msg.into())
    }

    /// Create a new embedding error.
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        KagamiError::Embedding(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        KagamiError::SerializationError(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        KagamiError::Other(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        KagamiError::Config(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        KagamiError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        KagamiError::Other(format!("Not found: {}", msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = KagamiError::index("Test index error");
        assert_eq!(error.to_string(), "Index error: Test index error");

        let error = KagamiError::storage("Test storage error");
        assert_eq!(error.to_string(), "Storage error: Test storage error");

        let error = KagamiError::embedding("Test embedding error");
        assert_eq!(error.to_string(), "Embedding error: Test embedding error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let kagami_error = KagamiError::from(io_error);

        match kagami_error {
            KagamiError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
