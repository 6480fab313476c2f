//! Change-feed ordering and resumption against `PostgreSQL`.

use std::sync::Arc;
use std::time::Duration;

use crate::postgres::helpers::{open_task, prepared_store, test_runtime, user};
use chrono::Utc;
use futures::future::join_all;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use tasklane::indexer::{
    adapters::memory::InMemorySearchIndex, domain::SearchIndexName,
    services::ChangeCaptureIndexer,
};
use tasklane::pipeline::ChangeCaptureWorker;
use tasklane::store::adapters::postgres::PostgresKeyedStore;
use tasklane::store::domain::{ChangeKind, Entity, ItemKey, WriteCondition};
use tasklane::store::ports::{ChangeFeed, KeyedStore, StoreError};
use tasklane::task::domain::{TaskChanges, TaskStatus};

const WRITERS: usize = 6;
const WRITES_PER_WRITER: usize = 10;

async fn drain(
    store: &PostgresKeyedStore,
    checkpoint: &mut Option<u64>,
    observed: &mut Vec<u64>,
) -> usize {
    let batch = store
        .read_since(*checkpoint, 5)
        .await
        .expect("read change log");
    if let Some(last) = batch.last() {
        *checkpoint = Some(last.sequence);
    }
    let read = batch.len();
    observed.extend(batch.into_iter().map(|record| record.sequence));
    read
}

#[rstest]
fn log_records_each_write_kind_and_resumes_after_a_checkpoint(
    shared_test_cluster: &'static TestCluster,
) {
    let (_guard, store) = prepared_store(shared_test_cluster, "log_kinds", 1);
    let task = open_task("Logged");
    let key = ItemKey::task(task.id());
    let rt = test_runtime();
    rt.block_on(store.put(Entity::Task(task.clone()), Some(WriteCondition::NotExists)))
        .expect("insert task");
    let rejected = rt.block_on(store.put(Entity::Task(task), Some(WriteCondition::NotExists)));
    rt.block_on(store.update(
        &key,
        &TaskChanges::status(TaskStatus::InProgress, user("u1"), Utc::now())
            .expect("valid status change"),
        None,
    ))
    .expect("update task");
    rt.block_on(store.delete(&key, None)).expect("delete task");

    let head = rt.block_on(store.read_since(None, 2)).expect("read head");
    let checkpoint = head.last().map(|record| record.sequence);
    let tail = rt
        .block_on(store.read_since(checkpoint, 10))
        .expect("read tail");

    assert!(matches!(rejected, Err(StoreError::ConditionFailed(_))));
    let kinds: Vec<ChangeKind> = head.iter().chain(&tail).map(|record| record.kind).collect();
    assert_eq!(
        kinds,
        [ChangeKind::Insert, ChangeKind::Modify, ChangeKind::Remove]
    );
    let removal = tail.first().expect("removal recorded");
    assert!(removal.old_image.is_some());
    assert!(removal.new_image.is_none());
    assert!(head.iter().chain(&tail).all(|record| record.key == key));
}

#[rstest]
fn concurrent_writers_never_commit_behind_the_reader(shared_test_cluster: &'static TestCluster) {
    let (_guard, pg_store) = prepared_store(shared_test_cluster, "log_order", 8);
    let store = Arc::new(pg_store);
    let rt = test_runtime();

    let observed = rt.block_on(async {
        let writers: Vec<_> = (0..WRITERS)
            .map(|writer_no| {
                let writer = Arc::clone(&store);
                tokio::spawn(async move {
                    for n in 0..WRITES_PER_WRITER {
                        let task = open_task(&format!("Writer {writer_no} task {n}"));
                        writer
                            .put(Entity::Task(task), Some(WriteCondition::NotExists))
                            .await?;
                    }
                    Ok::<(), StoreError>(())
                })
            })
            .collect();

        let mut checkpoint = None;
        let mut observed = Vec::new();
        while !writers.iter().all(tokio::task::JoinHandle::is_finished) {
            drain(&store, &mut checkpoint, &mut observed).await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        for joined in join_all(writers).await {
            joined.expect("writer completes").expect("writes succeed");
        }
        while drain(&store, &mut checkpoint, &mut observed).await > 0 {}
        observed
    });

    let full: Vec<u64> = rt
        .block_on(store.read_since(None, 1_000))
        .expect("read full log")
        .into_iter()
        .map(|record| record.sequence)
        .collect();
    assert_eq!(full.len(), WRITERS * WRITES_PER_WRITER);
    assert_eq!(observed, full);
}

#[rstest]
fn a_restarted_worker_indexes_only_what_follows_its_checkpoint(
    shared_test_cluster: &'static TestCluster,
) {
    let (_guard, pg_store) = prepared_store(shared_test_cluster, "worker_restart", 2);
    let store = Arc::new(pg_store);
    let index = Arc::new(InMemorySearchIndex::new());
    let worker = || {
        ChangeCaptureWorker::new(
            Arc::clone(&store),
            ChangeCaptureIndexer::new(Arc::clone(&index), Arc::clone(&store)),
        )
        .with_batch_size(2)
    };
    let rt = test_runtime();
    for n in 0..3 {
        rt.block_on(store.put(
            Entity::Task(open_task(&format!("Indexed {n}"))),
            Some(WriteCondition::NotExists),
        ))
        .expect("insert task");
    }

    let mut first = worker();
    let first_report = rt.block_on(first.poll_once()).expect("first poll");
    let checkpoint = first.resume_point().expect("checkpoint after first batch");
    let mut restarted = worker().resume_after(checkpoint);
    let second_report = rt.block_on(restarted.poll_once()).expect("second poll");
    let idle_report = rt.block_on(restarted.poll_once()).expect("idle poll");

    assert_eq!(first_report.indexed, 2);
    assert_eq!(second_report.indexed, 1);
    assert_eq!(idle_report.indexed, 0);
    assert_eq!(index.count(SearchIndexName::Tasks), 3);
}
