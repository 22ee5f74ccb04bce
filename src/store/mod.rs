//! The remote-store contract.
//!
//! Everything network-facing sits behind [`RemoteStore`]: a narrow trait
//! covering collection listing, creation-from-sample, bulk insertion, and
//! stats. Transport concerns (HTTP, authentication, retries) belong to the
//! implementations; the pipeline only sees `Result`s, with a hard server
//! failure surfacing as [`crate::error::QuiverError::Api`].
//!
//! Retry and debug knobs live in [`StoreConfig`], an explicit value handed
//! to implementations at construction. There is no process-wide mutable
//! configuration store.

pub mod memory;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;

/// Configuration consulted by transport-owning store implementations.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum retry attempts for a failed call.
    pub max_retries: u32,

    /// Fixed delay between retry attempts.
    pub retry_backoff: Duration,

    /// Record requests without executing them (debugging aid).
    pub return_debug_request: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
            return_debug_request: false,
        }
    }
}

/// Response from a bulk-insert call that the server accepted.
///
/// Per-document failures are data, not errors: they are reported here and
/// folded into the aggregate insert outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkInsertResponse {
    /// Identifiers of documents the server rejected.
    #[serde(default)]
    pub failed_document_ids: Vec<String>,
}

/// Collection statistics, used to size progress reporting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Number of stored documents.
    pub document_count: usize,
}

/// The remote collaborator the ingestion pipeline writes to.
///
/// Implementations must be `Send + Sync`; pooled ingestion calls
/// [`RemoteStore::bulk_insert`] from multiple worker threads.
pub trait RemoteStore: Send + Sync {
    /// List the names of existing collections.
    fn list_collections(&self) -> Result<Vec<String>>;

    /// Create a collection, inferring its schema from a sample document.
    fn create_collection_from_document(&self, name: &str, sample: &Document) -> Result<()>;

    /// Insert a batch of documents into a collection.
    ///
    /// `overwrite` controls whether an existing identifier is replaced or
    /// reported as failed; `insert_date` asks the server to stamp each
    /// stored document with the insertion time.
    fn bulk_insert(
        &self,
        collection: &str,
        documents: &[Document],
        overwrite: bool,
        insert_date: bool,
    ) -> Result<BulkInsertResponse>;

    /// Fetch collection statistics.
    fn collection_stats(&self, name: &str) -> Result<CollectionStats>;
}
