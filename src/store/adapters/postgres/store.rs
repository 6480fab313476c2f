//! `PostgreSQL` implementation of the keyed store.

use super::{
    models::{ChangeLogRow, ItemRow, NewChangeLogRow, NewItemRow},
    schema::{change_log, items},
};
use crate::store::{
    domain::{
        ChangeKind, ChangeRecord, Cursor, CursorPosition, Entity, EntityKind, IndexName,
        IndexQuery, ItemKey, Page, PageRequest, WriteCondition,
    },
    ports::{ChangeFeed, KeyedStore, StoreError, StoreResult},
};
use crate::task::domain::{Task, TaskChanges};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Text};

/// Advisory lock key serializing change-log appends.
const CHANGE_LOG_LOCK: i64 = 0x7461_736b_6c6f_67;

/// `PostgreSQL` connection pool type used by the store adapter.
pub type StorePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed keyed store.
///
/// Conditional writes run inside a transaction that locks the current row
/// (`SELECT ... FOR UPDATE`); "must not exist" inserts rely on
/// `ON CONFLICT DO NOTHING` so two racing inserts resolve to exactly one
/// winner. Each write appends its change-log row in the same transaction.
///
/// Change-log appends take a transaction-scoped advisory lock before the
/// sequence is drawn, so sequences commit in ascending order and a reader
/// that has seen sequence `n` never later finds a committed row below `n`.
#[derive(Debug, Clone)]
pub struct PostgresKeyedStore {
    pool: StorePgPool,
}

impl PostgresKeyedStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: StorePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::unavailable)?;
            f(&mut connection)
        })
        .await
        .map_err(StoreError::persistence)?
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::unavailable(err),
            DieselError::NotFound => Self::Corrupt("row vanished during transaction".to_owned()),
            _ => Self::persistence(err),
        }
    }
}

#[async_trait]
impl KeyedStore for PostgresKeyedStore {
    async fn get(&self, key: &ItemKey) -> StoreResult<Option<Entity>> {
        let lookup = key.clone();
        self.run_blocking(move |connection| {
            let row = items::table
                .filter(items::pk.eq(lookup.partition()))
                .filter(items::sk.eq(lookup.sort()))
                .select(ItemRow::as_select())
                .first::<ItemRow>(connection)
                .optional()?;
            row.map(row_to_entity).transpose()
        })
        .await
    }

    async fn put(&self, entity: Entity, condition: Option<WriteCondition>) -> StoreResult<()> {
        self.run_blocking(move |connection| {
            if condition == Some(WriteCondition::NotExists) {
                return insert_if_absent(connection, &entity);
            }
            connection.transaction(|tx| {
                let key = entity.key();
                let current = lock_item(tx, &key)?;
                check_condition(&key, condition, current.as_ref())?;
                upsert_item(tx, &entity)?;
                let kind = if current.is_some() {
                    ChangeKind::Modify
                } else {
                    ChangeKind::Insert
                };
                append_change(tx, kind, &key, current.as_ref(), Some(&entity))
            })
        })
        .await
    }

    async fn update(
        &self,
        key: &ItemKey,
        changes: &TaskChanges,
        condition: Option<WriteCondition>,
    ) -> StoreResult<Task> {
        let target = key.clone();
        let change_set = changes.clone();
        self.run_blocking(move |connection| {
            connection.transaction(|tx| {
                let current =
                    lock_item(tx, &target)?.ok_or_else(|| StoreError::NotFound(target.clone()))?;
                check_condition(&target, condition, Some(&current))?;
                let Entity::Task(mut task) = current.clone() else {
                    return Err(StoreError::KindMismatch {
                        key: target.clone(),
                        expected: EntityKind::Task,
                        found: current.kind(),
                    });
                };
                task.apply_changes(&change_set);
                let updated = Entity::Task(task.clone());
                upsert_item(tx, &updated)?;
                append_change(tx, ChangeKind::Modify, &target, Some(&current), Some(&updated))?;
                Ok(task)
            })
        })
        .await
    }

    async fn delete(
        &self,
        key: &ItemKey,
        condition: Option<WriteCondition>,
    ) -> StoreResult<Option<Entity>> {
        let target = key.clone();
        self.run_blocking(move |connection| {
            connection.transaction(|tx| {
                let current = lock_item(tx, &target)?;
                check_condition(&target, condition, current.as_ref())?;
                let Some(removed) = current else {
                    return Ok(None);
                };
                diesel::delete(
                    items::table
                        .filter(items::pk.eq(target.partition()))
                        .filter(items::sk.eq(target.sort())),
                )
                .execute(tx)?;
                append_change(tx, ChangeKind::Remove, &target, Some(&removed), None)?;
                Ok(Some(removed))
            })
        })
        .await
    }

    async fn query(&self, query: &IndexQuery, page: &PageRequest) -> StoreResult<Page<Entity>> {
        let start = page.start_after().map(Cursor::decode).transpose()?;
        let index = query.index();
        let partition = query.partition().to_owned();
        let pattern = format!("{}%", escape_like(query.sort_prefix().unwrap_or_default()));
        let limit = page.limit();
        let fetch = i64::try_from(limit + 1).map_err(StoreError::persistence)?;

        self.run_blocking(move |connection| {
            let (partition_column, sort_column) = index_columns(index);
            let (after_sort, after_pk, after_sk) = start.map_or_else(
                || (String::new(), String::new(), String::new()),
                |position| (position.sort, position.partition_key, position.sort_key),
            );
            let sql = format!(
                "SELECT pk, sk, entity_type, body, status_pk, status_sk, assignee_pk, \
                 assignee_sk, sprint_pk, sprint_sk, project_pk, project_sk, updated_at \
                 FROM items \
                 WHERE {partition_column} = $1 \
                 AND {sort_column} LIKE $2 ESCAPE '\\' \
                 AND ({sort_column}, pk, sk) > ($3, $4, $5) \
                 ORDER BY {sort_column}, pk, sk \
                 LIMIT $6"
            );
            let rows = diesel::sql_query(sql)
                .bind::<Text, _>(partition)
                .bind::<Text, _>(pattern)
                .bind::<Text, _>(after_sort)
                .bind::<Text, _>(after_pk)
                .bind::<Text, _>(after_sk)
                .bind::<BigInt, _>(fetch)
                .load::<ItemRow>(connection)?;

            let has_more = rows.len() > limit;
            let next = if has_more {
                rows.get(limit - 1).map(|last| {
                    Cursor::encode(&CursorPosition {
                        sort: index_sort_of(index, last),
                        partition_key: last.pk.clone(),
                        sort_key: last.sk.clone(),
                    })
                })
            } else {
                None
            };
            let entities = rows
                .into_iter()
                .take(limit)
                .map(row_to_entity)
                .collect::<StoreResult<Vec<_>>>()?;
            Ok(Page {
                items: entities,
                next,
            })
        })
        .await
    }
}

#[async_trait]
impl ChangeFeed for PostgresKeyedStore {
    async fn read_since(&self, after: Option<u64>, limit: usize) -> StoreResult<Vec<ChangeRecord>> {
        let floor = i64::try_from(after.unwrap_or_default()).map_err(StoreError::persistence)?;
        let batch = i64::try_from(limit).map_err(StoreError::persistence)?;
        self.run_blocking(move |connection| {
            let rows = change_log::table
                .filter(change_log::sequence.gt(floor))
                .order(change_log::sequence.asc())
                .limit(batch)
                .select(ChangeLogRow::as_select())
                .load::<ChangeLogRow>(connection)?;
            rows.into_iter().map(row_to_change).collect()
        })
        .await
    }
}

fn check_condition(
    key: &ItemKey,
    condition: Option<WriteCondition>,
    current: Option<&Entity>,
) -> StoreResult<()> {
    match condition {
        Some(predicate) if !predicate.holds(current) => {
            Err(StoreError::ConditionFailed(key.clone()))
        }
        _ => Ok(()),
    }
}

fn lock_item(connection: &mut PgConnection, key: &ItemKey) -> StoreResult<Option<Entity>> {
    let row = items::table
        .filter(items::pk.eq(key.partition()))
        .filter(items::sk.eq(key.sort()))
        .select(ItemRow::as_select())
        .for_update()
        .first::<ItemRow>(connection)
        .optional()?;
    row.map(row_to_entity).transpose()
}

fn insert_if_absent(connection: &mut PgConnection, entity: &Entity) -> StoreResult<()> {
    let key = entity.key();
    connection.transaction(|tx| {
        let inserted = diesel::insert_into(items::table)
            .values(&to_row(entity)?)
            .on_conflict((items::pk, items::sk))
            .do_nothing()
            .execute(tx)?;
        if inserted == 0 {
            return Err(StoreError::ConditionFailed(key.clone()));
        }
        append_change(tx, ChangeKind::Insert, &key, None, Some(entity))
    })
}

fn upsert_item(connection: &mut PgConnection, entity: &Entity) -> StoreResult<()> {
    let row = to_row(entity)?;
    diesel::insert_into(items::table)
        .values(&row)
        .on_conflict((items::pk, items::sk))
        .do_update()
        .set(&row)
        .execute(connection)?;
    Ok(())
}

fn append_change(
    connection: &mut PgConnection,
    kind: ChangeKind,
    key: &ItemKey,
    old_image: Option<&Entity>,
    new_image: Option<&Entity>,
) -> StoreResult<()> {
    // Held until commit; serializes sequence allocation with commit order.
    diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
        .bind::<BigInt, _>(CHANGE_LOG_LOCK)
        .execute(connection)?;
    let row = NewChangeLogRow {
        kind: kind.as_str().to_owned(),
        pk: key.partition().to_owned(),
        sk: key.sort().to_owned(),
        old_image: old_image.map(serde_json::to_value).transpose().map_err(StoreError::persistence)?,
        new_image: new_image.map(serde_json::to_value).transpose().map_err(StoreError::persistence)?,
        recorded_at: Utc::now(),
    };
    diesel::insert_into(change_log::table)
        .values(&row)
        .execute(connection)?;
    Ok(())
}

fn to_row(entity: &Entity) -> StoreResult<NewItemRow> {
    let key = entity.key();
    let body = serde_json::to_value(entity).map_err(StoreError::persistence)?;
    let split = |index: IndexName| {
        entity
            .index_entry(index)
            .map_or((None, None), |entry| (Some(entry.partition), Some(entry.sort)))
    };
    let (status_pk, status_sk) = split(IndexName::Status);
    let (assignee_pk, assignee_sk) = split(IndexName::Assignee);
    let (sprint_pk, sprint_sk) = split(IndexName::Sprint);
    let (project_pk, project_sk) = split(IndexName::Project);

    Ok(NewItemRow {
        pk: key.partition().to_owned(),
        sk: key.sort().to_owned(),
        entity_type: entity.kind().as_str().to_owned(),
        body,
        status_pk,
        status_sk,
        assignee_pk,
        assignee_sk,
        sprint_pk,
        sprint_sk,
        project_pk,
        project_sk,
        updated_at: Utc::now(),
    })
}

fn row_to_entity(row: ItemRow) -> StoreResult<Entity> {
    serde_json::from_value::<Entity>(row.body)
        .map_err(|err| StoreError::Corrupt(format!("{}/{}: {err}", row.pk, row.sk)))
}

fn row_to_change(row: ChangeLogRow) -> StoreResult<ChangeRecord> {
    let decode = |image: Option<serde_json::Value>| {
        image
            .map(serde_json::from_value::<Entity>)
            .transpose()
            .map_err(|err| StoreError::Corrupt(format!("change {}: {err}", row.sequence)))
    };
    Ok(ChangeRecord {
        sequence: u64::try_from(row.sequence).map_err(StoreError::persistence)?,
        kind: ChangeKind::try_from(row.kind.as_str()).map_err(StoreError::Corrupt)?,
        key: ItemKey::from_parts(row.pk.clone(), row.sk.clone()),
        old_image: decode(row.old_image.clone())?,
        new_image: decode(row.new_image.clone())?,
        recorded_at: row.recorded_at,
    })
}

const fn index_columns(index: IndexName) -> (&'static str, &'static str) {
    match index {
        IndexName::Primary => ("pk", "sk"),
        IndexName::Status => ("status_pk", "status_sk"),
        IndexName::Assignee => ("assignee_pk", "assignee_sk"),
        IndexName::Sprint => ("sprint_pk", "sprint_sk"),
        IndexName::Project => ("project_pk", "project_sk"),
    }
}

fn index_sort_of(index: IndexName, row: &ItemRow) -> String {
    let sort = match index {
        IndexName::Primary => Some(&row.sk),
        IndexName::Status => row.status_sk.as_ref(),
        IndexName::Assignee => row.assignee_sk.as_ref(),
        IndexName::Sprint => row.sprint_sk.as_ref(),
        IndexName::Project => row.project_sk.as_ref(),
    };
    sort.cloned().unwrap_or_default()
}

fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
