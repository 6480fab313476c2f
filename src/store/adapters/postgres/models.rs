//! Diesel row models for keyed store persistence.

use super::schema::{change_log, items};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for stored items.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ItemRow {
    /// Partition key.
    pub pk: String,
    /// Sort key.
    pub sk: String,
    /// Entity kind discriminator.
    pub entity_type: String,
    /// Serialized entity.
    pub body: Value,
    /// Status index partition.
    pub status_pk: Option<String>,
    /// Status index sort key.
    pub status_sk: Option<String>,
    /// Assignee index partition.
    pub assignee_pk: Option<String>,
    /// Assignee index sort key.
    pub assignee_sk: Option<String>,
    /// Sprint index partition.
    pub sprint_pk: Option<String>,
    /// Sprint index sort key.
    pub sprint_sk: Option<String>,
    /// Project index partition.
    pub project_pk: Option<String>,
    /// Project index sort key.
    pub project_sk: Option<String>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for stored items.
///
/// `None` index columns are written as `NULL` so an item leaving an index
/// (for example a task removed from its sprint) drops out of it.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = items)]
#[diesel(treat_none_as_null = true)]
pub struct NewItemRow {
    /// Partition key.
    pub pk: String,
    /// Sort key.
    pub sk: String,
    /// Entity kind discriminator.
    pub entity_type: String,
    /// Serialized entity.
    pub body: Value,
    /// Status index partition.
    pub status_pk: Option<String>,
    /// Status index sort key.
    pub status_sk: Option<String>,
    /// Assignee index partition.
    pub assignee_pk: Option<String>,
    /// Assignee index sort key.
    pub assignee_sk: Option<String>,
    /// Sprint index partition.
    pub sprint_pk: Option<String>,
    /// Sprint index sort key.
    pub sprint_sk: Option<String>,
    /// Project index partition.
    pub project_pk: Option<String>,
    /// Project index sort key.
    pub project_sk: Option<String>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for change-log records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = change_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChangeLogRow {
    /// Log position.
    pub sequence: i64,
    /// Change kind.
    pub kind: String,
    /// Partition key.
    pub pk: String,
    /// Sort key.
    pub sk: String,
    /// Item before the write.
    pub old_image: Option<Value>,
    /// Item after the write.
    pub new_image: Option<Value>,
    /// Commit timestamp.
    pub recorded_at: DateTime<Utc>,
}

/// Insert model for change-log records; the sequence is assigned by the
/// database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = change_log)]
pub struct NewChangeLogRow {
    /// Change kind.
    pub kind: String,
    /// Partition key.
    pub pk: String,
    /// Sort key.
    pub sk: String,
    /// Item before the write.
    pub old_image: Option<Value>,
    /// Item after the write.
    pub new_image: Option<Value>,
    /// Commit timestamp.
    pub recorded_at: DateTime<Utc>,
}
