//! In-memory search index.

use crate::indexer::{
    domain::{DocumentTarget, SearchDocument, SearchIndexName},
    ports::{SearchIndex, SearchIndexError, SearchIndexResult},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct IndexState {
    documents: BTreeMap<(SearchIndexName, String), Value>,
    failing_ids: BTreeSet<String>,
    writes: usize,
}

/// Search index backed by a map, with per-document failure injection.
#[derive(Debug, Clone, Default)]
pub struct InMemorySearchIndex {
    state: Arc<RwLock<IndexState>>,
}

impl InMemorySearchIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write for document `id` fail until cleared.
    pub fn fail_on(&self, id: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.failing_ids.insert(id.into());
        }
    }

    /// Clears injected failures.
    pub fn heal(&self) {
        if let Ok(mut state) = self.state.write() {
            state.failing_ids.clear();
        }
    }

    /// Returns a stored document body.
    #[must_use]
    pub fn document(&self, index: SearchIndexName, id: &str) -> Option<Value> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.documents.get(&(index, id.to_owned())).cloned())
    }

    /// Returns the number of documents in `index`.
    #[must_use]
    pub fn count(&self, index: SearchIndexName) -> usize {
        self.state.read().map_or(0, |state| {
            state
                .documents
                .keys()
                .filter(|(name, _)| *name == index)
                .count()
        })
    }

    /// Returns the number of successful writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.read().map_or(0, |state| state.writes)
    }

    fn write(
        &self,
        target: &DocumentTarget,
        apply: impl FnOnce(&mut BTreeMap<(SearchIndexName, String), Value>),
    ) -> SearchIndexResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| SearchIndexError::unavailable(std::io::Error::other(err.to_string())))?;
        if state.failing_ids.contains(&target.id) {
            return Err(SearchIndexError::unavailable(std::io::Error::other(format!(
                "injected failure for {}",
                target.id
            ))));
        }
        apply(&mut state.documents);
        state.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn upsert(&self, document: &SearchDocument) -> SearchIndexResult<()> {
        self.write(&document.target, |documents| {
            documents.insert(
                (document.target.index, document.target.id.clone()),
                document.body.clone(),
            );
        })
    }

    async fn delete(&self, target: &DocumentTarget) -> SearchIndexResult<()> {
        self.write(target, |documents| {
            documents.remove(&(target.index, target.id.clone()));
        })
    }
}
