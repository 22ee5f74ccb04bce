//! # Quiver
//!
//! Client-side ingestion pipeline for a remote vector store.
//!
//! ## Features
//!
//! - Dotted-path access to nested document fields
//! - Per-field model encoding with deterministic output-field naming
//! - Collection bootstrap from a sample document
//! - Chunked bulk insertion, sequential or across a fixed worker pool
//! - Partial-failure reconciliation into a single aggregate outcome

pub mod collection;
pub mod document;
pub mod encode;
pub mod error;
pub mod ingest;
pub mod store;

pub mod prelude {
    pub use crate::document::{Document, FieldPath, OnMissing};
    pub use crate::encode::{Encoder, EncodingDispatcher};
    pub use crate::error::{QuiverError, Result};
    pub use crate::ingest::{BulkInsertEngine, InsertOptions, InsertOutcome};
    pub use crate::store::{RemoteStore, StoreConfig};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
