//! Conditional writes and index paging against `PostgreSQL`.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::postgres::helpers::{open_task, prepared_store, test_runtime, user};
use chrono::Utc;
use futures::future::join_all;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use tasklane::store::domain::{
    ChangeKind, Cursor, Entity, IndexQuery, ItemKey, PageRequest, WriteCondition,
};
use tasklane::store::ports::{ChangeFeed, KeyedStore, StoreError};
use tasklane::task::domain::{TaskChanges, TaskId, TaskStatus};

#[rstest]
fn racing_inserts_have_exactly_one_winner(shared_test_cluster: &'static TestCluster) {
    let (_guard, pg_store) = prepared_store(shared_test_cluster, "race_insert", 8);
    let store = Arc::new(pg_store);
    let task = open_task("Contended");
    let rt = test_runtime();

    let results = rt.block_on(async {
        let attempts = (0..8).map(|_| {
            let writer = Arc::clone(&store);
            let entity = Entity::Task(task.clone());
            tokio::spawn(async move {
                writer
                    .put(entity, Some(WriteCondition::NotExists))
                    .await
            })
        });
        join_all(attempts).await
    });

    let outcomes: Vec<_> = results
        .into_iter()
        .map(|joined| joined.expect("writer task completes"))
        .collect();
    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().err())
            .all(|err| matches!(err, StoreError::ConditionFailed(_)))
    );
    let log = rt
        .block_on(store.read_since(None, 100))
        .expect("read change log");
    assert_eq!(log.len(), 1);
    assert_eq!(log.first().map(|record| record.kind), Some(ChangeKind::Insert));
}

#[rstest]
fn closing_twice_trips_the_status_condition(shared_test_cluster: &'static TestCluster) {
    let (_guard, store) = prepared_store(shared_test_cluster, "status_guard", 1);
    let task = open_task("Close me");
    let key = ItemKey::task(task.id());
    let rt = test_runtime();
    rt.block_on(store.put(Entity::Task(task), Some(WriteCondition::NotExists)))
        .expect("insert task");
    let close = TaskChanges::close(user("admin"), Utc::now());
    let guard = Some(WriteCondition::TaskStatusIsNot(TaskStatus::Closed));

    let closed = rt
        .block_on(store.update(&key, &close, guard))
        .expect("first close succeeds");
    let second = rt.block_on(store.update(&key, &close, guard));

    assert_eq!(closed.status(), TaskStatus::Closed);
    assert!(matches!(second, Err(StoreError::ConditionFailed(failed)) if failed == key));
    let stored = rt
        .block_on(store.get(&key))
        .expect("read task")
        .and_then(Entity::into_task)
        .expect("task is stored");
    assert_eq!(stored.status(), TaskStatus::Closed);
    assert_eq!(stored.closed_by(), Some(&user("admin")));
}

#[rstest]
fn updating_a_missing_task_is_not_found(shared_test_cluster: &'static TestCluster) {
    let (_guard, store) = prepared_store(shared_test_cluster, "missing_update", 1);
    let key = ItemKey::task(&TaskId::generate());
    let rt = test_runtime();

    let result = rt.block_on(store.update(
        &key,
        &TaskChanges::close(user("admin"), Utc::now()),
        None,
    ));

    assert!(matches!(result, Err(StoreError::NotFound(missing)) if missing == key));
}

#[rstest]
fn conditional_deletes_respect_existence(shared_test_cluster: &'static TestCluster) {
    let (_guard, store) = prepared_store(shared_test_cluster, "delete_guard", 1);
    let task = open_task("Short lived");
    let key = ItemKey::task(task.id());
    let rt = test_runtime();

    let absent = rt.block_on(store.delete(&key, Some(WriteCondition::Exists)));
    rt.block_on(store.put(Entity::Task(task.clone()), None))
        .expect("insert task");
    let removed = rt
        .block_on(store.delete(&key, Some(WriteCondition::Exists)))
        .expect("delete task");

    assert!(matches!(absent, Err(StoreError::ConditionFailed(_))));
    assert_eq!(removed, Some(Entity::Task(task)));
    assert!(rt.block_on(store.get(&key)).expect("read task").is_none());
}

#[rstest]
fn status_pages_resume_from_an_opaque_cursor(shared_test_cluster: &'static TestCluster) {
    let (_guard, store) = prepared_store(shared_test_cluster, "cursor_restart", 1);
    let rt = test_runtime();
    let mut created = BTreeSet::new();
    for n in 0..5 {
        let task = open_task(&format!("Task {n}"));
        created.insert(task.id().clone());
        rt.block_on(store.put(Entity::Task(task), Some(WriteCondition::NotExists)))
            .expect("insert task");
    }
    let query = IndexQuery::by_status(TaskStatus::Open);

    let first = rt
        .block_on(store.query(&query, &PageRequest::first(2)))
        .expect("first page");
    let token = first
        .next
        .as_ref()
        .map(|cursor| cursor.as_str().to_owned())
        .expect("more pages");
    // A resumed caller only has the opaque token.
    let resumed = store.clone();
    let mut seen: Vec<TaskId> = first
        .items
        .into_iter()
        .filter_map(Entity::into_task)
        .map(|task| task.id().clone())
        .collect();
    let mut request = PageRequest::first(2).after(Cursor::from_token(token));
    loop {
        let page = rt
            .block_on(resumed.query(&query, &request))
            .expect("next page");
        seen.extend(
            page.items
                .into_iter()
                .filter_map(Entity::into_task)
                .map(|task| task.id().clone()),
        );
        let Some(next) = page.next else { break };
        request = PageRequest::first(2).after(next);
    }

    assert_eq!(seen.len(), 5);
    assert_eq!(seen.iter().cloned().collect::<BTreeSet<_>>(), created);
}

#[rstest]
fn corrupted_cursor_is_rejected(shared_test_cluster: &'static TestCluster) {
    let (_guard, store) = prepared_store(shared_test_cluster, "bad_cursor", 1);
    let rt = test_runtime();
    let request = PageRequest::first(2).after(Cursor::from_token("not-a-cursor"));

    let result = rt.block_on(store.query(&IndexQuery::by_status(TaskStatus::Open), &request));

    assert!(matches!(result, Err(StoreError::InvalidCursor(_))));
}
