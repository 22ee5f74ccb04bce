//! Per-field encoding dispatch.
//!
//! [`EncodingDispatcher`] maps source fields to one or more encoders,
//! derives deterministic output-field names, rejects ambiguous
//! configurations before any encoding or network call, and drives the
//! encoders either one document at a time or in bulk over a whole chunk.
//!
//! # Output-field naming
//!
//! A source field with exactly one anonymous encoder writes to
//! `{field}_vector_`; in every other case the encoder's display name is
//! folded in: `{field}_{display_name}_vector_`. Two encoders on one field
//! resolving to the same output name is a configuration error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::warn;

use crate::document::{Document, FieldPath, VECTOR_FIELD_MARKER};
use crate::document::path::{set_field, set_field_across};
use crate::encode::encoder::Encoder;
use crate::error::{QuiverError, Result};

/// Component value used when dummy-filling a missing source field.
const DUMMY_COMPONENT: f32 = 1e-7;

/// Routes document fields to their encoders and writes vectors back.
pub struct EncodingDispatcher {
    /// Ordered (source field, encoders) pairs.
    models: Vec<(String, Vec<Arc<dyn Encoder>>)>,

    /// Output vector lengths observed on first successful encode,
    /// keyed by output field. Consulted for dummy fills.
    observed_dims: Mutex<HashMap<String, usize>>,
}

impl EncodingDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        EncodingDispatcher {
            models: Vec::new(),
            observed_dims: Mutex::new(HashMap::new()),
        }
    }

    /// Attach an encoder to a source field (builder form).
    pub fn with_model<S: Into<String>>(mut self, field: S, encoder: Arc<dyn Encoder>) -> Self {
        self.add_model(field, encoder);
        self
    }

    /// Attach an encoder to a source field.
    pub fn add_model<S: Into<String>>(&mut self, field: S, encoder: Arc<dyn Encoder>) {
        let field = field.into();
        match self.models.iter_mut().find(|(name, _)| *name == field) {
            Some((_, encoders)) => encoders.push(encoder),
            None => self.models.push((field, vec![encoder])),
        }
    }

    /// Whether any models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The source fields with registered encoders, in registration order.
    pub fn source_fields(&self) -> Vec<&str> {
        self.models.iter().map(|(field, _)| field.as_str()).collect()
    }

    /// The output field an encoder writes to for a given source field.
    pub fn output_field(&self, source: &str, encoder: &dyn Encoder) -> String {
        let siblings = self
            .models
            .iter()
            .find(|(field, _)| field == source)
            .map(|(_, encoders)| encoders.len())
            .unwrap_or(1);

        match encoder.display_name() {
            None if siblings == 1 => format!("{source}{VECTOR_FIELD_MARKER}"),
            name => format!("{source}_{}{VECTOR_FIELD_MARKER}", name.unwrap_or_default()),
        }
    }

    /// Validate the configuration before any encoding or network call.
    ///
    /// Detects output-name collisions between encoders on one source field,
    /// and in bulk mode requires every encoder to support bulk encoding.
    pub fn validate(&self, bulk: bool) -> Result<()> {
        for (field, encoders) in &self.models {
            let mut seen = HashSet::new();
            for encoder in encoders {
                let output = self.output_field(field, encoder.as_ref());
                if !seen.insert(output.clone()) {
                    return Err(QuiverError::naming_collision(format!(
                        "two encoders on field '{field}' both resolve to '{output}'"
                    )));
                }
                if bulk && !encoder.supports_bulk() {
                    return Err(QuiverError::invalid_operation(format!(
                        "bulk mode requested but encoder '{}' on field '{field}' \
                         does not support bulk encoding",
                        encoder.display_name().unwrap_or("unnamed")
                    )));
                }
            }
        }
        Ok(())
    }

    /// Encode a chunk of documents, switching on the requested mode.
    pub fn encode_chunk(&self, documents: &mut [Document], bulk: bool) -> Result<()> {
        if bulk {
            self.encode_documents_bulk(documents)
        } else {
            self.encode_documents(documents)
        }
    }

    /// Single-document mode: encode each document independently.
    ///
    /// A document missing the source field gets a dummy vector (every
    /// component `1e-7`) of the dimension previously observed for the
    /// output field, or the dimension the encoder declares up front.
    pub fn encode_documents(&self, documents: &mut [Document]) -> Result<()> {
        for (field, encoders) in &self.models {
            let path = FieldPath::parse(field);
            for encoder in encoders {
                let output = self.output_field(field, encoder.as_ref());
                for doc in documents.iter_mut() {
                    match path.resolve(doc).cloned() {
                        Some(value) => {
                            let vector = encoder.encode(&value)?;
                            self.remember_dimension(&output, vector.len());
                            set_field(&output, doc, vector_value(vector))?;
                        }
                        None => {
                            warn!(field = %field, "source field missing, dummy-filling vector");
                            let dim = self.dummy_dimension(&output, encoder.as_ref())?;
                            set_field(&output, doc, vector_value(vec![DUMMY_COMPONENT; dim]))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Bulk mode: one `bulk_encode` call per (field, encoder) pair across
    /// the whole chunk, results written back element-wise.
    ///
    /// Trades per-document fault isolation for throughput; a missing source
    /// field anywhere in the chunk is an error here.
    pub fn encode_documents_bulk(&self, documents: &mut [Document]) -> Result<()> {
        for (field, encoders) in &self.models {
            let path = FieldPath::parse(field);
            let values: Vec<Value> = documents
                .iter()
                .map(|doc| {
                    path.resolve(doc)
                        .cloned()
                        .ok_or_else(|| QuiverError::missing_field(field.clone()))
                })
                .collect::<Result<_>>()?;

            for encoder in encoders {
                let output = self.output_field(field, encoder.as_ref());
                let vectors = encoder.bulk_encode(&values)?;
                if vectors.len() != documents.len() {
                    return Err(QuiverError::invalid_operation(format!(
                        "bulk encode on '{field}' returned {} vectors for {} documents",
                        vectors.len(),
                        documents.len()
                    )));
                }
                if let Some(first) = vectors.first() {
                    self.remember_dimension(&output, first.len());
                }
                set_field_across(
                    &output,
                    documents,
                    vectors.into_iter().map(vector_value).collect(),
                )?;
            }
        }
        Ok(())
    }

    fn remember_dimension(&self, output: &str, dim: usize) {
        self.observed_dims
            .lock()
            .entry(output.to_string())
            .or_insert(dim);
    }

    fn dummy_dimension(&self, output: &str, encoder: &dyn Encoder) -> Result<usize> {
        if let Some(dim) = self.observed_dims.lock().get(output) {
            return Ok(*dim);
        }
        encoder.dimension().ok_or_else(|| {
            QuiverError::invalid_argument(format!(
                "cannot dummy-fill '{output}': no vector observed yet and the \
                 encoder declares no dimension"
            ))
        })
    }
}

impl Default for EncodingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn vector_value(vector: Vec<f32>) -> Value {
    Value::from(vector)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::path::{OnMissing, get_field};
    use crate::encode::precomputed::PrecomputedEncoder;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_output_field_naming() {
        let anonymous = Arc::new(PrecomputedEncoder::new(4));
        let named = Arc::new(PrecomputedEncoder::new(4).with_display_name("minilm"));

        let single = EncodingDispatcher::new().with_model("text", anonymous.clone());
        assert_eq!(
            single.output_field("text", anonymous.as_ref()),
            "text_vector_"
        );

        let multi = EncodingDispatcher::new()
            .with_model("text", anonymous.clone())
            .with_model("text", named.clone());
        assert_eq!(multi.output_field("text", named.as_ref()), "text_minilm_vector_");
        // An anonymous encoder among siblings still gets the long form.
        assert_eq!(multi.output_field("text", anonymous.as_ref()), "text__vector_");
    }

    #[test]
    fn test_validate_detects_naming_collision() {
        let a = Arc::new(PrecomputedEncoder::new(4).with_display_name("same"));
        let b = Arc::new(PrecomputedEncoder::new(8).with_display_name("same"));
        let dispatcher = EncodingDispatcher::new()
            .with_model("text", a)
            .with_model("text", b);

        let result = dispatcher.validate(false);
        assert!(matches!(result, Err(QuiverError::NamingCollision(_))));
    }

    #[test]
    fn test_validate_requires_bulk_capability() {
        #[derive(Debug)]
        struct NoBulk;
        impl Encoder for NoBulk {
            fn encode(&self, _input: &Value) -> Result<Vec<f32>> {
                Ok(vec![0.0; 2])
            }
        }

        let dispatcher = EncodingDispatcher::new().with_model("text", Arc::new(NoBulk));
        assert!(dispatcher.validate(false).is_ok());
        assert!(matches!(
            dispatcher.validate(true),
            Err(QuiverError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_single_mode_writes_vectors() {
        let dispatcher =
            EncodingDispatcher::new().with_model("text", Arc::new(PrecomputedEncoder::new(4)));
        let mut docs = vec![doc(json!({"text": "hello"})), doc(json!({"text": "world"}))];

        dispatcher.encode_documents(&mut docs).unwrap();

        for d in &docs {
            let vector = get_field("text_vector_", d, OnMissing::Raise).unwrap();
            assert_eq!(vector.as_array().unwrap().len(), 4);
        }
    }

    #[test]
    fn test_single_mode_dummy_fills_missing_field() {
        let dispatcher =
            EncodingDispatcher::new().with_model("text", Arc::new(PrecomputedEncoder::new(3)));
        let mut docs = vec![doc(json!({"text": "present"})), doc(json!({"other": 1}))];

        dispatcher.encode_documents(&mut docs).unwrap();

        let dummy = get_field("text_vector_", &docs[1], OnMissing::Raise).unwrap();
        let dummy = dummy.as_array().unwrap();
        assert_eq!(dummy.len(), 3);
        for component in dummy {
            assert!((component.as_f64().unwrap() - 1e-7).abs() < 1e-12);
        }
    }

    #[test]
    fn test_dummy_fill_uses_observed_dimension() {
        // Encoder that declares no dimension: the fill length must come
        // from a previously observed vector.
        #[derive(Debug)]
        struct Undeclared;
        impl Encoder for Undeclared {
            fn encode(&self, _input: &Value) -> Result<Vec<f32>> {
                Ok(vec![0.5; 6])
            }
        }

        let dispatcher = EncodingDispatcher::new().with_model("text", Arc::new(Undeclared));

        // Before any success the fill dimension is unknown.
        let mut missing_only = vec![doc(json!({"other": 1}))];
        assert!(dispatcher.encode_documents(&mut missing_only).is_err());

        let mut docs = vec![doc(json!({"text": "seed"})), doc(json!({"other": 1}))];
        dispatcher.encode_documents(&mut docs).unwrap();
        let dummy = get_field("text_vector_", &docs[1], OnMissing::Raise).unwrap();
        assert_eq!(dummy.as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_bulk_mode_round_trip() {
        let dispatcher =
            EncodingDispatcher::new().with_model("text", Arc::new(PrecomputedEncoder::new(4)));
        let mut docs = vec![doc(json!({"text": "a"})), doc(json!({"text": "b"}))];

        dispatcher.encode_documents_bulk(&mut docs).unwrap();

        let a = get_field("text_vector_", &docs[0], OnMissing::Raise).unwrap();
        let b = get_field("text_vector_", &docs[1], OnMissing::Raise).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bulk_mode_raises_on_missing_field() {
        let dispatcher =
            EncodingDispatcher::new().with_model("text", Arc::new(PrecomputedEncoder::new(4)));
        let mut docs = vec![doc(json!({"text": "a"})), doc(json!({"other": 1}))];

        let result = dispatcher.encode_documents_bulk(&mut docs);
        assert!(matches!(result, Err(QuiverError::MissingField(_))));
    }

    #[test]
    fn test_nested_source_field() {
        let dispatcher = EncodingDispatcher::new()
            .with_model("details.summary", Arc::new(PrecomputedEncoder::new(2)));
        let mut docs = vec![doc(json!({"details": {"summary": "deep"}}))];

        dispatcher.encode_documents(&mut docs).unwrap();

        assert!(
            get_field("details.summary_vector_", &docs[0], OnMissing::Raise).is_ok(),
            "vector lands beside the nested source field"
        );
    }
}
