//! Chunked bulk insertion: the orchestration core of the client.

pub mod config;
pub mod engine;

pub use config::{DEFAULT_CHUNK_SIZE, InsertOptions, PreprocessFn};
pub use engine::{BulkInsertEngine, IdCoverage, InsertOutcome, chunk_documents, normalize_ids};
