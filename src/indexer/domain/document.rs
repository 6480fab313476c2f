//! Search documents derived from store entities.

use crate::store::domain::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Search index holding one kind of document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchIndexName {
    /// Task documents.
    Tasks,
    /// Comment documents.
    Comments,
    /// Project documents.
    Projects,
}

impl SearchIndexName {
    /// Returns the index name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Comments => "comments",
            Self::Projects => "projects",
        }
    }
}

impl fmt::Display for SearchIndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an entity lives in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentTarget {
    /// Index name.
    pub index: SearchIndexName,
    /// Document identifier: the entity id.
    pub id: String,
}

impl DocumentTarget {
    /// Returns the target for an entity, or `None` for kinds that are not
    /// searchable.
    #[must_use]
    pub fn of(entity: &Entity) -> Option<Self> {
        let (index, id) = match entity {
            Entity::Task(task) => (SearchIndexName::Tasks, task.id().to_string()),
            Entity::Comment(comment) => (SearchIndexName::Comments, comment.id().to_string()),
            Entity::Project(project) => (SearchIndexName::Projects, project.id().to_string()),
            Entity::Assignment(_) | Entity::Attachment(_) | Entity::Sprint(_) => return None,
        };
        Some(Self { index, id })
    }
}

/// A document ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    /// Index and id.
    pub target: DocumentTarget,
    /// Document body: the entity's wire representation.
    pub body: Value,
}

impl SearchDocument {
    /// Builds the document for a searchable entity.
    ///
    /// Returns `Ok(None)` for kinds that are not searchable.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if the entity cannot be encoded.
    pub fn from_entity(entity: &Entity) -> Result<Option<Self>, serde_json::Error> {
        let Some(target) = DocumentTarget::of(entity) else {
            return Ok(None);
        };
        let body = match entity {
            Entity::Task(task) => serde_json::to_value(task)?,
            Entity::Comment(comment) => serde_json::to_value(comment)?,
            Entity::Project(project) => serde_json::to_value(project)?,
            Entity::Assignment(_) | Entity::Attachment(_) | Entity::Sprint(_) => return Ok(None),
        };
        Ok(Some(Self { target, body }))
    }
}
