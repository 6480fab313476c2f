//! Ports for the search index.

mod search_index;

pub use search_index::{SearchIndex, SearchIndexError, SearchIndexResult};
