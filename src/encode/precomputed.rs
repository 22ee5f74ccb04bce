//! Deterministic encoder for offline-computed vectors and tests.
//!
//! [`PrecomputedEncoder`] never calls a model: it derives a fixed-dimension
//! vector from a hash of the input value's JSON form. Use it when documents
//! need stable, reproducible vectors without a real embedding backend, e.g.
//! in scenario tests or demos.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use crate::encode::encoder::Encoder;
use crate::error::Result;

/// An encoder producing deterministic pseudo-embeddings.
///
/// The same input value always yields the same vector, and distinct inputs
/// almost always yield distinct vectors. Bulk encoding is supported.
#[derive(Debug, Clone)]
pub struct PrecomputedEncoder {
    dimension: usize,
    display_name: Option<String>,
}

impl PrecomputedEncoder {
    /// Create an encoder with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        PrecomputedEncoder {
            dimension,
            display_name: None,
        }
    }

    /// Attach a display name, used to disambiguate output field names.
    pub fn with_display_name<S: Into<String>>(mut self, name: S) -> Self {
        self.display_name = Some(name.into());
        self
    }

    fn vector_for(&self, input: &Value) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        input.to_string().hash(&mut hasher);
        let mut state = hasher.finish();

        (0..self.dimension)
            .map(|_| {
                // xorshift step keeps successive components decorrelated.
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                ((state % 2000) as f32 / 1000.0) - 1.0
            })
            .collect()
    }
}

impl Encoder for PrecomputedEncoder {
    fn encode(&self, input: &Value) -> Result<Vec<f32>> {
        Ok(self.vector_for(input))
    }

    fn supports_bulk(&self) -> bool {
        true
    }

    fn bulk_encode(&self, inputs: &[Value]) -> Result<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|input| self.vector_for(input)).collect())
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deterministic_output() {
        let encoder = PrecomputedEncoder::new(8);

        let a = encoder.encode(&json!("hello")).unwrap();
        let b = encoder.encode(&json!("hello")).unwrap();
        let c = encoder.encode(&json!("world")).unwrap();

        assert_eq!(a.len(), 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_bulk_matches_single() {
        let encoder = PrecomputedEncoder::new(4);
        let inputs = vec![json!("x"), json!("y")];

        let bulk = encoder.bulk_encode(&inputs).unwrap();
        assert_eq!(bulk[0], encoder.encode(&inputs[0]).unwrap());
        assert_eq!(bulk[1], encoder.encode(&inputs[1]).unwrap());
    }

    #[test]
    fn test_display_name() {
        let encoder = PrecomputedEncoder::new(4).with_display_name("hash");
        assert_eq!(encoder.display_name(), Some("hash"));
        assert!(encoder.supports_bulk());
    }
}
