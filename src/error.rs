//! Error types for the Quiver client.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! is the [`QuiverError`] enum. Configuration and naming problems are raised
//! before any network call is made; per-document failures reported by the
//! server are never raised as errors and instead land in the aggregate
//! insert outcome.
//!
//! # Examples
//!
//! ```
//! use quiver::error::{QuiverError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(QuiverError::invalid_argument("Invalid input"))
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

/// The main error type for Quiver operations.
#[derive(Error, Debug)]
pub enum QuiverError {
    /// A requested field path does not resolve in a document.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Invalid collection identifier (rejected before any network call).
    #[error("Collection name error: {0}")]
    CollectionName(String),

    /// Two encoders on one source field resolve to the same output field.
    #[error("Naming collision: {0}")]
    NamingCollision(String),

    /// The server reported a hard error, or the transport gave up retrying.
    #[error("API error: {0}")]
    Api(String),

    /// Invalid operation (e.g. bulk mode requested without bulk capability).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Thread join errors
    #[error("Thread join error: {0}")]
    ThreadJoinError(String),

    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

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

/// Result type alias for operations that may fail with QuiverError.
pub type Result<T> = std::result::Result<T, QuiverError>;

impl QuiverError {
    /// Create a new missing-field error.
    pub fn missing_field<S: Into<String>>(msg: S) -> Self {
        QuiverError::MissingField(msg.into())
    }

    /// Create a new collection-name error.
    pub fn collection_name<S: Into<String>>(msg: S) -> Self {
        QuiverError::CollectionName(msg.into())
    }

    /// Create a new naming-collision error.
    pub fn naming_collision<S: Into<String>>(msg: S) -> Self {
        QuiverError::NamingCollision(msg.into())
    }

    /// Create a new API error.
    pub fn api<S: Into<String>>(msg: S) -> Self {
        QuiverError::Api(msg.into())
    }

    /// Create a new invalid-operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        QuiverError::InvalidOperation(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        QuiverError::Other(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        QuiverError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        QuiverError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        QuiverError::Other(format!("Internal error: {}", msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = QuiverError::missing_field("details.name");
        assert_eq!(error.to_string(), "Missing field: details.name");

        let error = QuiverError::collection_name("Bad Name!");
        assert_eq!(error.to_string(), "Collection name error: Bad Name!");

        let error = QuiverError::api("server unavailable");
        assert_eq!(error.to_string(), "API error: server unavailable");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let quiver_error = QuiverError::from(io_error);

        match quiver_error {
            QuiverError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_naming_collision_is_distinct_from_missing_field() {
        let collision = QuiverError::naming_collision("text -> text_vector_");
        assert!(matches!(collision, QuiverError::NamingCollision(_)));
        assert!(!matches!(collision, QuiverError::MissingField(_)));
    }
}
