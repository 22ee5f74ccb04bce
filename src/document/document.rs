//! Document structure for schema-less ingestion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{QuiverError, Result};

/// Name of the identifier field.
pub const ID_FIELD: &str = "_id";

/// Substring marking a field as holding a numeric embedding.
pub const VECTOR_FIELD_MARKER: &str = "_vector_";

/// A document represents a single record to be ingested.
///
/// Documents are insertion-ordered mappings from field names to arbitrary
/// JSON values; values may themselves be mappings, sequences, or scalars.
/// Nested values are addressed with dotted paths (see [`crate::document::path`]).
///
/// By convention a field whose name contains `_vector_` holds a numeric
/// embedding, and a top-level `_id` field holds the document identifier.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document { fields: Map::new() }
    }

    /// Build a document from a JSON value; the value must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Document { fields }),
            other => Err(QuiverError::invalid_argument(format!(
                "document must be a JSON object, got {other}"
            ))),
        }
    }

    /// Insert a top-level field value, replacing any previous value.
    pub fn insert<S: Into<String>>(&mut self, name: S, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Get a top-level field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Check if the document has a top-level field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a top-level field.
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Get the number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Get the underlying field map mutably.
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// The document identifier, if present and already a string.
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Set the document identifier.
    pub fn set_id<S: Into<String>>(&mut self, id: S) {
        self.fields.insert(ID_FIELD.to_string(), Value::String(id.into()));
    }

    /// Coerce a present `_id` to its string form.
    ///
    /// Numbers and booleans are rendered with their JSON display form;
    /// strings pass through untouched. Returns whether an `_id` was present.
    pub fn normalize_id(&mut self) -> bool {
        match self.fields.get(ID_FIELD) {
            None => false,
            Some(Value::String(_)) => true,
            Some(other) => {
                let coerced = match other {
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => other.to_string(),
                };
                self.fields.insert(ID_FIELD.to_string(), Value::String(coerced));
                true
            }
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Document { fields }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.fields)
    }
}
