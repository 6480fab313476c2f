//! Indexing services.

mod indexer;

pub use indexer::{ChangeCaptureIndexer, IndexerError};
