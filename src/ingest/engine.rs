//! The chunked bulk-insert engine.
//!
//! [`BulkInsertEngine::insert`] drives one batch end to end: fail-fast
//! validation, identifier normalization, collection bootstrap, chunking,
//! per-chunk encoding and submission (sequentially or across a fixed-size
//! worker pool), and aggregation of per-document failures into one
//! [`InsertOutcome`].
//!
//! # Execution models
//!
//! With `workers == 1` chunks are processed one after another on the
//! calling thread and a hard error aborts the remaining chunks. With
//! `workers > 1` chunks flow through a bounded task channel to a fixed
//! rayon pool; completions are collected unordered, and a hard error makes
//! the whole call return `Err` once the pool has drained. Both models
//! surface hard errors the same way; per-document failures reported inside
//! a successful chunk response never abort other chunks.

use std::sync::Arc;

use crossbeam_channel::{bounded, unbounded};
use rayon::ThreadPoolBuilder;
use tracing::warn;

use crate::collection::{CollectionBootstrapper, validate_collection_name};
use crate::document::{Document, ID_FIELD};
use crate::encode::EncodingDispatcher;
use crate::error::{QuiverError, Result};
use crate::ingest::config::InsertOptions;
use crate::store::RemoteStore;

/// Aggregate result of a bulk-insert call.
///
/// Every originally-submitted identifier that failed appears exactly once
/// in `failed_document_ids`; their order across chunks is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Documents the server accepted.
    pub inserted_successfully: usize,

    /// Documents the server rejected.
    pub failed: usize,

    /// Identifiers of the rejected documents.
    pub failed_document_ids: Vec<String>,
}

/// How many of a batch's documents carry an `_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdCoverage {
    /// Every document has an identifier.
    All,
    /// Some documents have an identifier, some do not.
    Partial,
    /// No document has an identifier.
    None,
}

/// Normalize identifiers across a batch and classify their coverage.
///
/// If any document carries `_id`, every present `_id` is coerced to its
/// string form so identifier comparisons are never type-ambiguous.
/// Partial or absent coverage each emit one advisory warning; the server
/// may assign identifiers, so neither blocks insertion.
pub fn normalize_ids(documents: &mut [Document]) -> IdCoverage {
    let with_id = documents
        .iter()
        .filter(|doc| doc.has_field(ID_FIELD))
        .count();

    let coverage = if with_id == 0 {
        IdCoverage::None
    } else if with_id == documents.len() {
        IdCoverage::All
    } else {
        IdCoverage::Partial
    };

    if with_id > 0 {
        for doc in documents.iter_mut() {
            doc.normalize_id();
        }
    }

    match coverage {
        IdCoverage::All => {}
        IdCoverage::Partial => {
            warn!("some documents have no '_id' field; the server will assign those")
        }
        IdCoverage::None => warn!("no document has an '_id' field; the server will assign them"),
    }
    coverage
}

/// Partition documents into fixed-size chunks, preserving order.
///
/// Concatenating the chunks restores the input exactly.
pub fn chunk_documents(documents: Vec<Document>, chunk_size: usize) -> Vec<Vec<Document>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(documents.len().div_ceil(chunk_size));
    let mut current = Vec::with_capacity(chunk_size.min(documents.len()));
    for doc in documents {
        current.push(doc);
        if current.len() == chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Drives chunked, optionally pooled, bulk insertion against a remote store.
pub struct BulkInsertEngine {
    store: Arc<dyn RemoteStore>,
}

impl BulkInsertEngine {
    /// Create an engine over the given remote store.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        BulkInsertEngine { store }
    }

    /// Insert a batch of documents into `collection`.
    ///
    /// Configuration problems (invalid collection name, encoder naming
    /// collisions, missing bulk capability, a preprocessing hook combined
    /// with `workers > 1`) are rejected before any network call.
    pub fn insert(
        &self,
        collection: &str,
        mut documents: Vec<Document>,
        dispatcher: Option<&EncodingDispatcher>,
        options: &InsertOptions,
    ) -> Result<InsertOutcome> {
        validate_collection_name(collection)?;
        if documents.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let workers = options.effective_workers();
        if options.preprocess.is_some() && workers > 1 {
            return Err(QuiverError::invalid_operation(
                "preprocessing hooks cannot be distributed across a worker pool; \
                 use workers = 1",
            ));
        }
        if let Some(dispatcher) = dispatcher {
            dispatcher.validate(options.bulk_encode)?;
        }

        normalize_ids(&mut documents);
        self.bootstrap(collection, &documents[0], dispatcher, options)?;

        let total_submitted = documents.len();
        let chunks = chunk_documents(documents, options.chunk_size);

        let failed_document_ids = if workers == 1 {
            self.run_sequential(collection, chunks, dispatcher, options)?
        } else {
            self.run_pooled(collection, chunks, dispatcher, options, workers)?
        };

        let failed = failed_document_ids.len();
        Ok(InsertOutcome {
            inserted_successfully: total_submitted - failed,
            failed,
            failed_document_ids,
        })
    }

    /// Create the collection from the first (encoded) document if absent.
    fn bootstrap(
        &self,
        collection: &str,
        first: &Document,
        dispatcher: Option<&EncodingDispatcher>,
        options: &InsertOptions,
    ) -> Result<()> {
        let mut sample = vec![first.clone()];
        if let Some(dispatcher) = dispatcher {
            dispatcher.encode_chunk(&mut sample, options.bulk_encode)?;
        }
        CollectionBootstrapper::new(self.store.clone()).ensure_collection(collection, &sample[0])?;
        Ok(())
    }

    /// Preprocess, encode, and submit one chunk; returns the server-reported
    /// failed identifiers.
    fn process_chunk(
        &self,
        collection: &str,
        chunk: &mut Vec<Document>,
        dispatcher: Option<&EncodingDispatcher>,
        options: &InsertOptions,
        run_hook: bool,
    ) -> Result<Vec<String>> {
        if run_hook {
            if let Some(hook) = &options.preprocess {
                for doc in chunk.iter_mut() {
                    hook(doc)?;
                }
            }
        }
        if let Some(dispatcher) = dispatcher {
            dispatcher.encode_chunk(chunk, options.bulk_encode)?;
        }
        let response =
            self.store
                .bulk_insert(collection, chunk, options.overwrite, options.insert_date)?;
        Ok(response.failed_document_ids)
    }

    fn run_sequential(
        &self,
        collection: &str,
        chunks: Vec<Vec<Document>>,
        dispatcher: Option<&EncodingDispatcher>,
        options: &InsertOptions,
    ) -> Result<Vec<String>> {
        let mut failed_document_ids = Vec::new();
        for mut chunk in chunks {
            let failed = self.process_chunk(collection, &mut chunk, dispatcher, options, true)?;
            failed_document_ids.extend(failed);
        }
        Ok(failed_document_ids)
    }

    /// Pooled execution: a bounded task queue feeding a fixed worker pool,
    /// completions collected unordered.
    fn run_pooled(
        &self,
        collection: &str,
        chunks: Vec<Vec<Document>>,
        dispatcher: Option<&EncodingDispatcher>,
        options: &InsertOptions,
        workers: usize,
    ) -> Result<Vec<String>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("quiver-insert-{i}"))
            .build()
            .map_err(|e| QuiverError::internal(format!("failed to create worker pool: {e}")))?;

        let (task_tx, task_rx) = bounded::<Vec<Document>>(workers * 2);
        let (result_tx, result_rx) = unbounded::<Result<Vec<String>>>();

        pool.scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    while let Ok(mut chunk) = task_rx.recv() {
                        let result = self.process_chunk(
                            collection,
                            &mut chunk,
                            dispatcher,
                            options,
                            false,
                        );
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(task_rx);
            drop(result_tx);

            for chunk in chunks {
                if task_tx.send(chunk).is_err() {
                    break;
                }
            }
            drop(task_tx);
        });

        let mut failed_document_ids = Vec::new();
        let mut first_error = None;
        for result in result_rx.iter() {
            match result {
                Ok(failed) => failed_document_ids.extend(failed),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(failed_document_ids),
        }
    }
}
