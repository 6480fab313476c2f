//! Change-log records emitted for every committed write.

use super::{Entity, EntityKind, ItemKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of write recorded in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// Item created.
    Insert,
    /// Item replaced or updated.
    Modify,
    /// Item deleted.
    Remove,
}

impl ChangeKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Modify => "MODIFY",
            Self::Remove => "REMOVE",
        }
    }
}

impl TryFrom<&str> for ChangeKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INSERT" => Ok(Self::Insert),
            "MODIFY" => Ok(Self::Modify),
            "REMOVE" => Ok(Self::Remove),
            other => Err(format!("unknown change kind: {other}")),
        }
    }
}

/// One committed write with its before and after images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Monotonically increasing position in the log.
    pub sequence: u64,
    /// Kind of write.
    pub kind: ChangeKind,
    /// Primary key of the written item.
    pub key: ItemKey,
    /// Item before the write; absent for inserts.
    pub old_image: Option<Entity>,
    /// Item after the write; absent for removals.
    pub new_image: Option<Entity>,
    /// Commit time.
    pub recorded_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// Returns the most recent image: the new one, or the old one for
    /// removals.
    #[must_use]
    pub const fn latest_image(&self) -> Option<&Entity> {
        match (&self.new_image, &self.old_image) {
            (Some(image), _) | (None, Some(image)) => Some(image),
            (None, None) => None,
        }
    }

    /// Returns the kind of entity written.
    #[must_use]
    pub fn entity_kind(&self) -> Option<EntityKind> {
        self.latest_image().map(Entity::kind)
    }
}
