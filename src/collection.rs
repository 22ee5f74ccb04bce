//! Collection naming, schema advisories, and bootstrap-on-first-insert.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::document::{Document, ID_FIELD, VECTOR_FIELD_MARKER};
use crate::error::{QuiverError, Result};
use crate::store::RemoteStore;

/// Maximum accepted collection-name length.
pub const MAX_COLLECTION_NAME_LEN: usize = 240;

lazy_static! {
    static ref COLLECTION_NAME_RE: Regex =
        Regex::new(r"^[a-z0-9_.\-]+$").expect("collection name pattern is valid");
}

/// Validate a collection identifier.
///
/// Accepts only lowercase letters, digits, `_`, `-` and `.`, at most 240
/// characters. Rejection happens before any network call.
pub fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(QuiverError::collection_name("collection name is empty"));
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(QuiverError::collection_name(format!(
            "collection name exceeds {MAX_COLLECTION_NAME_LEN} characters: '{name}'"
        )));
    }
    if !COLLECTION_NAME_RE.is_match(name) {
        return Err(QuiverError::collection_name(format!(
            "collection name may only contain [a-z0-9_.-]: '{name}'"
        )));
    }
    Ok(())
}

/// Advisory findings from a document-convention scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaReport {
    /// A top-level `_id` field is present.
    pub has_id: bool,
    /// Some field (possibly nested) follows the `_vector_` convention.
    pub has_vector_field: bool,
}

/// Scan a document for the identifier and vector-field conventions.
///
/// Emits one warning per missing convention. Advisory only: a failing
/// report never blocks ingestion, since the server may assign identifiers
/// and documents without vectors are legal.
pub fn check_schema(doc: &Document) -> SchemaReport {
    let report = SchemaReport {
        has_id: doc.has_field(ID_FIELD),
        has_vector_field: contains_vector_field(doc.fields()),
    };
    if !report.has_id {
        warn!("document has no '_id' field; the server will assign one");
    }
    if !report.has_vector_field {
        warn!("document has no '{VECTOR_FIELD_MARKER}' field; similarity search needs one");
    }
    report
}

fn contains_vector_field(fields: &serde_json::Map<String, serde_json::Value>) -> bool {
    fields.iter().any(|(name, value)| {
        name.contains(VECTOR_FIELD_MARKER)
            || matches!(value, serde_json::Value::Object(nested) if contains_vector_field(nested))
    })
}

/// Creates a remote collection on first contact, inferring its schema from
/// a sample document.
pub struct CollectionBootstrapper {
    store: Arc<dyn RemoteStore>,
}

impl CollectionBootstrapper {
    /// Create a bootstrapper over the given remote store.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        CollectionBootstrapper { store }
    }

    /// Ensure `name` exists remotely, creating it from `sample` if absent.
    ///
    /// Runs the advisory schema check on the sample either way. Returns
    /// whether a creation request was issued.
    pub fn ensure_collection(&self, name: &str, sample: &Document) -> Result<bool> {
        validate_collection_name(name)?;
        check_schema(sample);

        if self.store.list_collections()?.iter().any(|c| c == name) {
            return Ok(false);
        }
        self.store.create_collection_from_document(name, sample)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::StoreConfig;
    use crate::store::memory::MemoryStore;

    #[test]
    fn test_collection_name_validation() {
        assert!(validate_collection_name("products_2024.v1-final").is_ok());
        assert!(validate_collection_name("a").is_ok());

        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("Has Upper").is_err());
        assert!(validate_collection_name("emoji🙂").is_err());
        assert!(validate_collection_name(&"x".repeat(241)).is_err());
        assert!(validate_collection_name(&"x".repeat(240)).is_ok());
    }

    #[test]
    fn test_name_error_kind() {
        let err = validate_collection_name("Bad Name").unwrap_err();
        assert!(matches!(err, QuiverError::CollectionName(_)));
    }

    #[test]
    fn test_check_schema_reports_conventions() {
        let full = Document::from_value(json!({
            "_id": "1",
            "text_vector_": [0.1, 0.2]
        }))
        .unwrap();
        let report = check_schema(&full);
        assert!(report.has_id);
        assert!(report.has_vector_field);

        let nested = Document::from_value(json!({
            "details": {"summary_vector_": [0.1]}
        }))
        .unwrap();
        let report = check_schema(&nested);
        assert!(!report.has_id);
        assert!(report.has_vector_field, "nested vector fields count");

        let bare = Document::from_value(json!({"title": "none"})).unwrap();
        let report = check_schema(&bare);
        assert!(!report.has_id);
        assert!(!report.has_vector_field);
    }

    #[test]
    fn test_ensure_collection_creates_once() {
        let store = Arc::new(MemoryStore::new(StoreConfig::default()));
        let bootstrapper = CollectionBootstrapper::new(store.clone());
        let sample = Document::from_value(json!({"_id": "1", "text_vector_": [0.5]})).unwrap();

        assert!(bootstrapper.ensure_collection("demo", &sample).unwrap());
        assert!(!bootstrapper.ensure_collection("demo", &sample).unwrap());
        assert_eq!(store.list_collections().unwrap(), vec!["demo".to_string()]);
    }

    #[test]
    fn test_ensure_collection_rejects_bad_name_without_network() {
        let store = Arc::new(MemoryStore::new(StoreConfig::default()));
        let bootstrapper = CollectionBootstrapper::new(store.clone());
        let sample = Document::new();

        let result = bootstrapper.ensure_collection("Bad Name", &sample);
        assert!(matches!(result, Err(QuiverError::CollectionName(_))));
        assert!(store.requests().is_empty(), "no request may be issued");
    }
}
