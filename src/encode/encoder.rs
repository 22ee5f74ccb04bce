//! Unified encoder trait for document ingestion.
//!
//! This module provides the [`Encoder`] trait, the interface between the
//! ingestion pipeline and caller-supplied embedding models. An encoder turns
//! a raw field value into a numeric vector; the pipeline decides where that
//! vector lands in the document (see [`crate::encode::dispatcher`]).
//!
//! # Capabilities
//!
//! Bulk encoding is an explicit capability, not runtime introspection:
//! an encoder that can embed many values in one call overrides
//! [`Encoder::supports_bulk`] and [`Encoder::bulk_encode`]. When a caller
//! requests bulk mode, every referenced encoder must report the capability
//! up front or the whole call is rejected before any network traffic.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`: in pooled ingestion, chunks are
//! encoded concurrently from multiple worker threads.
//!
//! # Example
//!
//! ```
//! use serde_json::Value;
//! use quiver::encode::Encoder;
//! use quiver::error::{QuiverError, Result};
//!
//! #[derive(Debug)]
//! struct CharCountEncoder;
//!
//! impl Encoder for CharCountEncoder {
//!     fn encode(&self, input: &Value) -> Result<Vec<f32>> {
//!         let text = input
//!             .as_str()
//!             .ok_or_else(|| QuiverError::invalid_argument("expected a string"))?;
//!         Ok(vec![text.len() as f32, 1.0])
//!     }
//!
//!     fn dimension(&self) -> Option<usize> {
//!         Some(2)
//!     }
//! }
//! ```

use std::fmt::Debug;

use serde_json::Value;

use crate::error::{QuiverError, Result};

/// A caller-supplied component converting a raw field value into a vector.
pub trait Encoder: Send + Sync + Debug {
    /// Generate an embedding vector for one input value.
    fn encode(&self, input: &Value) -> Result<Vec<f32>>;

    /// Whether this encoder can embed many values in one call.
    fn supports_bulk(&self) -> bool {
        false
    }

    /// Generate embeddings for multiple inputs in one call.
    ///
    /// Only called when [`Encoder::supports_bulk`] reports `true`; the
    /// default implementation rejects the call.
    fn bulk_encode(&self, inputs: &[Value]) -> Result<Vec<Vec<f32>>> {
        let _ = inputs;
        Err(QuiverError::invalid_operation(format!(
            "encoder '{}' does not support bulk encoding",
            self.display_name().unwrap_or("unnamed")
        )))
    }

    /// Optional display name, used to disambiguate output field names when
    /// several encoders attach to the same source field.
    fn display_name(&self) -> Option<&str> {
        None
    }

    /// Output vector length, when the encoder declares it up front.
    ///
    /// Used for dummy-filling documents that lack the source field before
    /// the encoder has produced its first vector.
    fn dimension(&self) -> Option<usize> {
        None
    }
}
