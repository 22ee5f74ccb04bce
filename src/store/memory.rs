//! In-memory reference implementation of the remote store.
//!
//! [`MemoryStore`] behaves like a small, well-behaved server: it assigns
//! identifiers to id-less documents, validates `_vector_` fields, honors
//! the overwrite flag by rejecting duplicate identifiers, and stamps an
//! insert date on request. Every call is recorded, so tests can assert
//! which requests a pipeline actually issued (including that fail-fast
//! paths issued none).

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use uuid::Uuid;

use crate::document::{Document, VECTOR_FIELD_MARKER};
use crate::error::{QuiverError, Result};
use crate::store::{BulkInsertResponse, CollectionStats, RemoteStore, StoreConfig};

/// Field stamped with the insertion time when `insert_date` is requested.
pub const INSERT_DATE_FIELD: &str = "insert_date_";

/// A request observed by the store, for test inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    /// A collection listing.
    ListCollections,
    /// A creation-from-sample call.
    CreateCollection { name: String },
    /// A bulk insert of `document_count` documents.
    BulkInsert {
        collection: String,
        document_count: usize,
        overwrite: bool,
    },
    /// A stats fetch.
    CollectionStats { name: String },
}

#[derive(Debug, Default)]
struct Collection {
    documents: HashMap<String, Document>,
}

/// An in-memory [`RemoteStore`] used by tests and demos.
#[derive(Debug)]
pub struct MemoryStore {
    config: StoreConfig,
    collections: RwLock<HashMap<String, Collection>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Self {
        MemoryStore {
            config,
            collections: RwLock::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request issued so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Stored documents of a collection, keyed by identifier.
    pub fn documents(&self, collection: &str) -> HashMap<String, Document> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: RecordedRequest) {
        self.requests.lock().push(request);
    }
}

impl RemoteStore for MemoryStore {
    fn list_collections(&self) -> Result<Vec<String>> {
        self.record(RecordedRequest::ListCollections);
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn create_collection_from_document(&self, name: &str, _sample: &Document) -> Result<()> {
        self.record(RecordedRequest::CreateCollection {
            name: name.to_string(),
        });
        if self.config.return_debug_request {
            return Ok(());
        }
        self.collections
            .write()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    fn bulk_insert(
        &self,
        collection: &str,
        documents: &[Document],
        overwrite: bool,
        insert_date: bool,
    ) -> Result<BulkInsertResponse> {
        self.record(RecordedRequest::BulkInsert {
            collection: collection.to_string(),
            document_count: documents.len(),
            overwrite,
        });
        if self.config.return_debug_request {
            return Ok(BulkInsertResponse::default());
        }

        let mut guard = self.collections.write();
        let target = guard.get_mut(collection).ok_or_else(|| {
            QuiverError::api(format!("collection '{collection}' does not exist"))
        })?;

        let mut failed_document_ids = Vec::new();
        for doc in documents {
            let mut doc = doc.clone();
            let id = match doc.id() {
                Some(id) => id.to_string(),
                None => {
                    let id = Uuid::new_v4().to_string();
                    doc.set_id(id.clone());
                    id
                }
            };

            if !vector_fields_are_numeric(doc.fields()) {
                failed_document_ids.push(id);
                continue;
            }
            if !overwrite && target.documents.contains_key(&id) {
                failed_document_ids.push(id);
                continue;
            }
            if insert_date {
                doc.insert(INSERT_DATE_FIELD, Value::String(Utc::now().to_rfc3339()));
            }
            target.documents.insert(id, doc);
        }

        Ok(BulkInsertResponse {
            failed_document_ids,
        })
    }

    fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        self.record(RecordedRequest::CollectionStats {
            name: name.to_string(),
        });
        let guard = self.collections.read();
        let target = guard
            .get(name)
            .ok_or_else(|| QuiverError::api(format!("collection '{name}' does not exist")))?;
        Ok(CollectionStats {
            document_count: target.documents.len(),
        })
    }
}

fn vector_fields_are_numeric(fields: &serde_json::Map<String, Value>) -> bool {
    fields.iter().all(|(name, value)| {
        if name.contains(VECTOR_FIELD_MARKER) {
            matches!(value, Value::Array(items) if items.iter().all(Value::is_number))
        } else if let Value::Object(nested) = value {
            vector_fields_are_numeric(nested)
        } else {
            true
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store() -> MemoryStore {
        let store = MemoryStore::new(StoreConfig::default());
        store
            .create_collection_from_document("demo", &Document::new())
            .unwrap();
        store
    }

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_assigns_ids_to_idless_documents() {
        let store = store();
        let docs = vec![doc(json!({"title": "no id"}))];

        let response = store.bulk_insert("demo", &docs, false, false).unwrap();
        assert!(response.failed_document_ids.is_empty());

        let stored = store.documents("demo");
        assert_eq!(stored.len(), 1);
        let stored_doc = stored.values().next().unwrap();
        assert!(stored_doc.id().is_some());
    }

    #[test]
    fn test_duplicate_ids_fail_without_overwrite() {
        let store = store();
        let docs = vec![doc(json!({"_id": "a"})), doc(json!({"_id": "b"}))];

        let first = store.bulk_insert("demo", &docs, false, false).unwrap();
        assert!(first.failed_document_ids.is_empty());

        let second = store.bulk_insert("demo", &docs, false, false).unwrap();
        let mut failed = second.failed_document_ids.clone();
        failed.sort();
        assert_eq!(failed, vec!["a".to_string(), "b".to_string()]);

        // Overwrite replaces instead.
        let third = store.bulk_insert("demo", &docs, true, false).unwrap();
        assert!(third.failed_document_ids.is_empty());
    }

    #[test]
    fn test_rejects_non_numeric_vector_fields() {
        let store = store();
        let docs = vec![
            doc(json!({"_id": "good", "text_vector_": [0.1, 0.2]})),
            doc(json!({"_id": "bad", "text_vector_": "not a vector"})),
        ];

        let response = store.bulk_insert("demo", &docs, false, false).unwrap();
        assert_eq!(response.failed_document_ids, vec!["bad".to_string()]);
        assert_eq!(store.documents("demo").len(), 1);
    }

    #[test]
    fn test_insert_date_stamp() {
        let store = store();
        let docs = vec![doc(json!({"_id": "a"}))];

        store.bulk_insert("demo", &docs, false, true).unwrap();
        let stored = store.documents("demo");
        assert!(stored["a"].has_field(INSERT_DATE_FIELD));
    }

    #[test]
    fn test_unknown_collection_is_an_api_error() {
        let store = MemoryStore::new(StoreConfig::default());
        let result = store.bulk_insert("ghost", &[], false, false);
        assert!(matches!(result, Err(QuiverError::Api(_))));
    }

    #[test]
    fn test_debug_mode_records_without_applying() {
        let config = StoreConfig {
            return_debug_request: true,
            ..Default::default()
        };
        let store = MemoryStore::new(config);
        store
            .create_collection_from_document("demo", &Document::new())
            .unwrap();
        assert!(store.documents("demo").is_empty());
        assert_eq!(
            store.requests(),
            vec![RecordedRequest::CreateCollection {
                name: "demo".to_string()
            }]
        );
    }

    #[test]
    fn test_collection_stats() {
        let store = store();
        let docs = vec![doc(json!({"_id": "a"})), doc(json!({"_id": "b"}))];
        store.bulk_insert("demo", &docs, false, false).unwrap();

        let stats = store.collection_stats("demo").unwrap();
        assert_eq!(stats.document_count, 2);
    }
}
