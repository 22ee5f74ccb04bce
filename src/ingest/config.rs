//! Options for a bulk-insert call.

use std::fmt;
use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;

/// Default number of documents per chunk, bounding both the network
/// payload and the unit of parallel work.
pub const DEFAULT_CHUNK_SIZE: usize = 15;

/// A caller-supplied hook run over every document before encoding.
///
/// Hooks may mutate the document freely; they only run in sequential mode
/// (`workers == 1`), since distributing caller-owned mutation across a
/// worker pool is not safe.
pub type PreprocessFn = Arc<dyn Fn(&mut Document) -> Result<()> + Send + Sync>;

/// Per-call options for [`crate::ingest::BulkInsertEngine::insert`].
#[derive(Clone)]
pub struct InsertOptions {
    /// Documents per chunk (default 15).
    pub chunk_size: usize,

    /// Worker threads; `1` means sequential processing on the calling
    /// thread. Clamped to the number of available CPUs.
    pub workers: usize,

    /// Replace documents whose identifier already exists.
    pub overwrite: bool,

    /// Ask the server to stamp each document with the insertion time.
    pub insert_date: bool,

    /// Encode each (field, encoder) pair once per chunk instead of once
    /// per document. Requires every encoder to support bulk encoding.
    pub bulk_encode: bool,

    /// Optional per-document hook, sequential mode only.
    pub preprocess: Option<PreprocessFn>,
}

impl InsertOptions {
    /// Worker count actually used, clamped to `1..=num_cpus`.
    pub fn effective_workers(&self) -> usize {
        self.workers.clamp(1, num_cpus::get())
    }
}

impl Default for InsertOptions {
    fn default() -> Self {
        InsertOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: 1,
            overwrite: false,
            insert_date: true,
            bulk_encode: false,
            preprocess: None,
        }
    }
}

impl fmt::Debug for InsertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertOptions")
            .field("chunk_size", &self.chunk_size)
            .field("workers", &self.workers)
            .field("overwrite", &self.overwrite)
            .field("insert_date", &self.insert_date)
            .field("bulk_encode", &self.bulk_encode)
            .field("preprocess", &self.preprocess.as_ref().map(|_| "<hook>"))
            .finish()
    }
}
