//! Change-capture indexer tests.

use crate::events::domain::{DomainEvent, EventEnvelope, TASK_SERVICE_SOURCE, TaskCreated};
use crate::indexer::{
    adapters::memory::InMemorySearchIndex,
    domain::{DocumentTarget, FailureReason, IndexOutcome, SearchDocument, SearchIndexName},
    ports::{SearchIndex, SearchIndexError, SearchIndexResult},
    services::{ChangeCaptureIndexer, IndexerError},
};
use crate::store::{
    adapters::memory::InMemoryKeyedStore,
    domain::{ChangeRecord, Entity, ItemKey, WriteCondition},
    ports::{ChangeFeed, KeyedStore},
};
use crate::task::domain::{
    Assignment, Comment, Priority, Task, TaskChanges, TaskDraft, TaskStatus,
};
use crate::test_support::{SteppingClock, user};
use async_trait::async_trait;
use mockable::Clock;
use mockall::{mock, predicate::eq};
use rstest::{fixture, rstest};
use std::sync::Arc;

mock! {
    Index {}

    #[async_trait]
    impl SearchIndex for Index {
        async fn upsert(&self, document: &SearchDocument) -> SearchIndexResult<()>;
        async fn delete(&self, target: &DocumentTarget) -> SearchIndexResult<()>;
    }
}

struct Fixture {
    store: Arc<InMemoryKeyedStore>,
    index: Arc<InMemorySearchIndex>,
    indexer: ChangeCaptureIndexer<InMemorySearchIndex, InMemoryKeyedStore>,
    clock: SteppingClock,
}

impl Fixture {
    async fn seed_task(&self, title: &str) -> Task {
        let task = Task::create(TaskDraft::new(title), user("admin"), &self.clock)
            .expect("valid task");
        self.store
            .put(Entity::Task(task.clone()), Some(WriteCondition::NotExists))
            .await
            .expect("seed task");
        task
    }

    async fn set_status(&self, task: &Task, status: TaskStatus) {
        let changes =
            TaskChanges::status(status, user("admin"), self.clock.utc()).expect("valid status");
        self.store
            .update(&ItemKey::task(task.id()), &changes, None)
            .await
            .expect("update task");
    }

    async fn log(&self) -> Vec<ChangeRecord> {
        self.store.read_since(None, 100).await.expect("read log")
    }
}

#[fixture]
fn fixture() -> Fixture {
    let store = Arc::new(InMemoryKeyedStore::new());
    let index = Arc::new(InMemorySearchIndex::new());
    let indexer = ChangeCaptureIndexer::new(Arc::clone(&index), Arc::clone(&store));
    Fixture {
        store,
        index,
        indexer,
        clock: SteppingClock::new(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inserts_and_modifies_upsert_latest_document(fixture: Fixture) {
    let task = fixture.seed_task("Index me").await;
    fixture.set_status(&task, TaskStatus::InReview).await;

    let report = fixture.indexer.process_batch(&fixture.log().await).await;

    assert!(report.is_success());
    assert_eq!(report.indexed, 2);
    let document = fixture
        .index
        .document(SearchIndexName::Tasks, task.id().as_str())
        .expect("task indexed");
    assert_eq!(document["status"], "IN_REVIEW");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replaying_a_batch_is_idempotent(fixture: Fixture) {
    let task = fixture.seed_task("Replay").await;
    fixture.set_status(&task, TaskStatus::Blocked).await;
    let log = fixture.log().await;

    fixture.indexer.process_batch(&log).await;
    let replay = fixture.indexer.process_batch(&log).await;

    assert!(replay.is_success());
    assert_eq!(fixture.index.count(SearchIndexName::Tasks), 1);
    let document = fixture
        .index
        .document(SearchIndexName::Tasks, task.id().as_str())
        .expect("task indexed");
    assert_eq!(document["status"], "BLOCKED");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removals_delete_and_absent_deletes_succeed(fixture: Fixture) {
    let task = fixture.seed_task("Gone soon").await;
    fixture
        .store
        .delete(&ItemKey::task(task.id()), None)
        .await
        .expect("delete task");
    let log = fixture.log().await;
    let removal: Vec<ChangeRecord> = log.iter().skip(1).cloned().collect();

    let only_removal = fixture.indexer.process_batch(&removal).await;
    let full = fixture.indexer.process_batch(&log).await;

    assert_eq!(only_removal.deleted, 1);
    assert!(only_removal.is_success());
    assert!(full.is_success());
    assert_eq!(fixture.index.count(SearchIndexName::Tasks), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn comments_are_indexed_and_assignments_skipped(fixture: Fixture) {
    let task = fixture.seed_task("Busy").await;
    let comment = Comment::new(task.id().clone(), user("u1"), "hi", Vec::new(), &fixture.clock)
        .expect("valid comment");
    fixture
        .store
        .put(Entity::Comment(comment.clone()), None)
        .await
        .expect("store comment");
    fixture
        .store
        .put(
            Entity::Assignment(Assignment::new(
                task.id().clone(),
                user("u1"),
                user("admin"),
                &fixture.clock,
            )),
            None,
        )
        .await
        .expect("store assignment");

    let report = fixture.indexer.process_batch(&fixture.log().await).await;

    assert_eq!((report.indexed, report.skipped), (2, 1));
    assert!(
        fixture
            .index
            .document(SearchIndexName::Comments, &comment.id().to_string())
            .is_some()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_key_holds_back_only_its_own_records(fixture: Fixture) {
    let healthy = fixture.seed_task("Healthy").await;
    let broken = fixture.seed_task("Broken").await;
    fixture.set_status(&broken, TaskStatus::InProgress).await;
    fixture.set_status(&healthy, TaskStatus::InProgress).await;
    fixture.index.fail_on(broken.id().as_str());

    let report = fixture.indexer.process_batch(&fixture.log().await).await;

    assert_eq!(report.indexed, 2);
    assert_eq!(report.failed_sequences(), [2, 3]);
    let reasons: Vec<bool> = report
        .failed
        .iter()
        .map(|failed| failed.reason == FailureReason::HeldBack)
        .collect();
    assert_eq!(reasons, [false, true]);
    assert_eq!(report.first_failure(), Some(2));

    fixture.index.heal();
    let retry = fixture.indexer.process_batch(&fixture.log().await).await;
    assert!(retry.is_success());
    assert_eq!(fixture.index.count(SearchIndexName::Tasks), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn events_re_read_current_state(fixture: Fixture) {
    let task = fixture.seed_task("From event").await;
    let envelope = EventEnvelope::new(
        TASK_SERVICE_SOURCE,
        DomainEvent::TaskCreated(TaskCreated {
            task_id: task.id().clone(),
            title: "stale title".to_owned(),
            created_by: user("admin"),
            priority: Priority::Medium,
        }),
        fixture.clock.utc(),
    );

    let indexed = fixture
        .indexer
        .handle_event(&envelope)
        .await
        .expect("index event");
    assert_eq!(indexed, IndexOutcome::Indexed);
    let document = fixture
        .index
        .document(SearchIndexName::Tasks, task.id().as_str())
        .expect("task indexed");
    assert_eq!(document["title"], "From event");

    fixture
        .store
        .delete(&ItemKey::task(task.id()), None)
        .await
        .expect("delete task");
    let deleted = fixture
        .indexer
        .handle_event(&envelope)
        .await
        .expect("index event");
    assert_eq!(deleted, IndexOutcome::Deleted);
    assert_eq!(fixture.index.count(SearchIndexName::Tasks), 0);
}

fn created_event(task: &Task, clock: &SteppingClock) -> EventEnvelope {
    EventEnvelope::new(
        TASK_SERVICE_SOURCE,
        DomainEvent::TaskCreated(TaskCreated {
            task_id: task.id().clone(),
            title: task.title().to_owned(),
            created_by: user("admin"),
            priority: Priority::Medium,
        }),
        clock.utc(),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn event_for_missing_task_only_deletes(fixture: Fixture) {
    let task = fixture.seed_task("Short lived").await;
    let envelope = created_event(&task, &fixture.clock);
    fixture
        .store
        .delete(&ItemKey::task(task.id()), None)
        .await
        .expect("delete task");
    let mut index = MockIndex::new();
    index.expect_upsert().never();
    index
        .expect_delete()
        .with(eq(DocumentTarget {
            index: SearchIndexName::Tasks,
            id: task.id().to_string(),
        }))
        .times(1)
        .returning(|_| Ok(()));
    let indexer = ChangeCaptureIndexer::new(Arc::new(index), Arc::clone(&fixture.store));

    let outcome = indexer.handle_event(&envelope).await.expect("delete succeeds");

    assert_eq!(outcome, IndexOutcome::Deleted);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn index_failures_surface_from_the_event_path(fixture: Fixture) {
    let task = fixture.seed_task("Unlucky").await;
    let envelope = created_event(&task, &fixture.clock);
    let mut index = MockIndex::new();
    index
        .expect_upsert()
        .times(1)
        .returning(|document| {
            Err(SearchIndexError::Rejected {
                index: document.target.index.as_str().to_owned(),
                id: document.target.id.clone(),
                reason: "mapping conflict".to_owned(),
            })
        });
    let indexer = ChangeCaptureIndexer::new(Arc::new(index), Arc::clone(&fixture.store));

    let result = indexer.handle_event(&envelope).await;

    assert!(matches!(result, Err(IndexerError::Index(_))));
}
