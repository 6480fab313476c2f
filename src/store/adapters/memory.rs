//! In-memory keyed store for tests and local runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::{
    domain::{
        ChangeKind, ChangeRecord, Cursor, CursorPosition, Entity, EntityKind, IndexEntry,
        IndexName, IndexQuery, ItemKey, Page, PageRequest, WriteCondition,
    },
    ports::{ChangeFeed, KeyedStore, StoreError, StoreResult},
};
use crate::task::domain::{Task, TaskChanges};

/// Thread-safe in-memory keyed store.
///
/// Items, index positions, and the change log are updated under one write
/// lock, so every write is atomic with its index maintenance and its log
/// record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyedStore {
    state: Arc<RwLock<StoreState>>,
    injected_failures: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct StoreState {
    items: BTreeMap<ItemKey, Entity>,
    index: BTreeSet<IndexPosition>,
    log: Vec<ChangeRecord>,
    last_sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct IndexPosition {
    index: IndexName,
    partition: String,
    sort: String,
    key: ItemKey,
}

impl IndexPosition {
    fn new(index: IndexName, entry: IndexEntry, key: ItemKey) -> Self {
        Self {
            index,
            partition: entry.partition,
            sort: entry.sort,
            key,
        }
    }
}

impl InMemoryKeyedStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` operations fail with
    /// [`StoreError::Unavailable`].
    pub fn fail_next(&self, count: usize) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    /// Returns the number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().map(|state| state.items.len()).unwrap_or_default()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the full change log.
    #[must_use]
    pub fn change_log(&self) -> Vec<ChangeRecord> {
        self.read()
            .map(|state| state.log.clone())
            .unwrap_or_default()
    }

    fn take_injected_failure(&self) -> StoreResult<()> {
        let injected = self
            .injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();
        if injected {
            return Err(StoreError::unavailable(std::io::Error::other(
                "injected store failure",
            )));
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
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

fn commit(
    state: &mut StoreState,
    key: ItemKey,
    old_image: Option<Entity>,
    new_image: Option<Entity>,
) {
    if let Some(old) = &old_image {
        for (index, entry) in old.index_entries() {
            state
                .index
                .remove(&IndexPosition::new(index, entry, key.clone()));
        }
    }
    match &new_image {
        Some(new) => {
            for (index, entry) in new.index_entries() {
                state
                    .index
                    .insert(IndexPosition::new(index, entry, key.clone()));
            }
            state.items.insert(key.clone(), new.clone());
        }
        None => {
            state.items.remove(&key);
        }
    }

    let kind = match (&old_image, &new_image) {
        (None, Some(_)) => ChangeKind::Insert,
        (Some(_), Some(_)) => ChangeKind::Modify,
        _ => ChangeKind::Remove,
    };
    state.last_sequence += 1;
    let sequence = state.last_sequence;
    state.log.push(ChangeRecord {
        sequence,
        kind,
        key,
        old_image,
        new_image,
        recorded_at: Utc::now(),
    });
}

#[async_trait]
impl KeyedStore for InMemoryKeyedStore {
    async fn get(&self, key: &ItemKey) -> StoreResult<Option<Entity>> {
        self.take_injected_failure()?;
        Ok(self.read()?.items.get(key).cloned())
    }

    async fn put(&self, entity: Entity, condition: Option<WriteCondition>) -> StoreResult<()> {
        self.take_injected_failure()?;
        let key = entity.key();
        let mut state = self.write()?;
        let current = state.items.get(&key).cloned();
        check_condition(&key, condition, current.as_ref())?;
        commit(&mut state, key, current, Some(entity));
        Ok(())
    }

    async fn update(
        &self,
        key: &ItemKey,
        changes: &TaskChanges,
        condition: Option<WriteCondition>,
    ) -> StoreResult<Task> {
        self.take_injected_failure()?;
        let mut state = self.write()?;
        let current = state
            .items
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        check_condition(key, condition, Some(&current))?;
        let Entity::Task(mut task) = current.clone() else {
            return Err(StoreError::KindMismatch {
                key: key.clone(),
                expected: EntityKind::Task,
                found: current.kind(),
            });
        };
        task.apply_changes(changes);
        commit(
            &mut state,
            key.clone(),
            Some(current),
            Some(Entity::Task(task.clone())),
        );
        Ok(task)
    }

    async fn delete(
        &self,
        key: &ItemKey,
        condition: Option<WriteCondition>,
    ) -> StoreResult<Option<Entity>> {
        self.take_injected_failure()?;
        let mut state = self.write()?;
        let current = state.items.get(key).cloned();
        check_condition(key, condition, current.as_ref())?;
        if current.is_none() {
            return Ok(None);
        }
        commit(&mut state, key.clone(), current.clone(), None);
        Ok(current)
    }

    async fn query(&self, query: &IndexQuery, page: &PageRequest) -> StoreResult<Page<Entity>> {
        self.take_injected_failure()?;
        let lower = match page.start_after() {
            Some(cursor) => {
                let position = cursor.decode()?;
                Bound::Excluded(IndexPosition {
                    index: query.index(),
                    partition: query.partition().to_owned(),
                    key: position.item_key(),
                    sort: position.sort,
                })
            }
            None => Bound::Included(IndexPosition {
                index: query.index(),
                partition: query.partition().to_owned(),
                sort: query.sort_prefix().unwrap_or_default().to_owned(),
                key: ItemKey::from_parts(String::new(), String::new()),
            }),
        };

        let state = self.read()?;
        let limit = page.limit();
        let positions: Vec<&IndexPosition> = state
            .index
            .range((lower, Bound::Unbounded))
            .take_while(|position| {
                position.index == query.index()
                    && position.partition == query.partition()
                    && query
                        .sort_prefix()
                        .is_none_or(|prefix| position.sort.starts_with(prefix))
            })
            .take(limit + 1)
            .collect();

        let has_more = positions.len() > limit;
        let items = positions
            .iter()
            .take(limit)
            .filter_map(|position| state.items.get(&position.key).cloned())
            .collect();
        let next = if has_more {
            positions.get(limit - 1).map(|last| {
                Cursor::encode(&CursorPosition {
                    sort: last.sort.clone(),
                    partition_key: last.key.partition().to_owned(),
                    sort_key: last.key.sort().to_owned(),
                })
            })
        } else {
            None
        };

        Ok(Page { items, next })
    }
}

#[async_trait]
impl ChangeFeed for InMemoryKeyedStore {
    async fn read_since(&self, after: Option<u64>, limit: usize) -> StoreResult<Vec<ChangeRecord>> {
        let floor = after.unwrap_or_default();
        Ok(self
            .read()?
            .log
            .iter()
            .filter(|record| record.sequence > floor)
            .take(limit)
            .cloned()
            .collect())
    }
}
