//! Diesel schema for keyed store persistence.

diesel::table! {
    /// One row per stored item, with derived index-key columns.
    items (pk, sk) {
        /// Partition key.
        pk -> Text,
        /// Sort key.
        sk -> Text,
        /// Entity kind discriminator.
        entity_type -> Text,
        /// Serialized entity.
        body -> Jsonb,
        /// Status index partition.
        status_pk -> Nullable<Text>,
        /// Status index sort key.
        status_sk -> Nullable<Text>,
        /// Assignee index partition.
        assignee_pk -> Nullable<Text>,
        /// Assignee index sort key.
        assignee_sk -> Nullable<Text>,
        /// Sprint index partition.
        sprint_pk -> Nullable<Text>,
        /// Sprint index sort key.
        sprint_sk -> Nullable<Text>,
        /// Project index partition.
        project_pk -> Nullable<Text>,
        /// Project index sort key.
        project_sk -> Nullable<Text>,
        /// Last write timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ordered record of committed writes.
    change_log (sequence) {
        /// Log position.
        sequence -> Int8,
        /// `INSERT`, `MODIFY`, or `REMOVE`.
        kind -> Text,
        /// Partition key of the written item.
        pk -> Text,
        /// Sort key of the written item.
        sk -> Text,
        /// Item before the write.
        old_image -> Nullable<Jsonb>,
        /// Item after the write.
        new_image -> Nullable<Jsonb>,
        /// Commit timestamp.
        recorded_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(items, change_log);
