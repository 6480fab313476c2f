//! End-to-end task lifecycle over in-memory adapters.

use crate::in_memory::helpers::{App, admin, app, member, user_id};
use tasklane::error::{ApiError, ErrorKind};
use tasklane::events::domain::DomainEvent;
use tasklane::indexer::domain::SearchIndexName;
use tasklane::store::{domain::IndexQuery, ports::KeyedStore};
use tasklane::task::{
    domain::{Priority, TaskDraft, TaskStatus},
    services::TaskServiceError,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_moves_from_creation_to_closure(app: App) {
    let task = app
        .engine
        .create_task(
            TaskDraft::new("Write design doc").with_priority(Priority::High),
            &admin(),
        )
        .await
        .expect("admin creates task");
    assert_eq!(task.status(), TaskStatus::Open);

    app.engine
        .assign(task.id(), &user_id("u1"), &admin())
        .await
        .expect("admin assigns u1");
    app.engine
        .update_status(task.id(), "IN_PROGRESS", &member("u1"))
        .await
        .expect("assignee starts work");
    app.engine
        .close(task.id(), &admin())
        .await
        .expect("admin closes task");
    let reopen = app
        .engine
        .update_status(task.id(), "OPEN", &member("u1"))
        .await;

    let Err(err) = reopen else {
        panic!("closed task must not change status");
    };
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert_eq!(ApiError::from(err).status, 400);

    let events = app.drain_events().await;
    let previous = events.iter().find_map(|envelope| match envelope.event() {
        DomainEvent::TaskStatusUpdated(detail) => Some(detail.previous_status),
        _ => None,
    });
    assert_eq!(previous, Some(TaskStatus::Open));
    assert_eq!(
        app.bus.detail_types(),
        ["TaskCreated", "TaskAssigned", "TaskStatusUpdated", "TaskClosed"]
    );

    let to_assignee: Vec<String> = app
        .sender
        .sent_to("u1@example.com")
        .into_iter()
        .map(|message| message.subject)
        .collect();
    assert_eq!(
        to_assignee,
        [
            "New Task Assigned: Write design doc",
            "Task Status Updated: Write design doc",
            "Task Closed: Write design doc",
        ]
    );
    assert_eq!(app.sender.sent_to("admin@example.com").len(), 1);

    let document = app
        .index
        .document(SearchIndexName::Tasks, task.id().as_str())
        .expect("task indexed");
    assert_eq!(document["status"], "CLOSED");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn member_cannot_create_tasks(app: App) {
    let result = app
        .engine
        .create_task(TaskDraft::new("Sneaky"), &member("u1"))
        .await;

    assert!(matches!(result, Err(TaskServiceError::PermissionDenied(_))));
    assert!(app.store.is_empty());
    assert!(app.bus.published().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_assignments_notify_once(app: App) {
    let task = app
        .engine
        .create_task(TaskDraft::new("Contended"), &admin())
        .await
        .expect("admin creates task");
    let actor = admin();
    let assignee = user_id("u2");

    let (first, second) = tokio::join!(
        app.engine.assign(task.id(), &assignee, &actor),
        app.engine.assign(task.id(), &assignee, &actor)
    );

    let conflicts = [&first, &second]
        .into_iter()
        .filter(|result| matches!(result, Err(err) if err.kind() == ErrorKind::Conflict))
        .count();
    assert_eq!(conflicts, 1);
    assert!(first.is_ok() || second.is_ok());
    let rows = app
        .store
        .query_all(&IndexQuery::assignments_of(task.id()))
        .await
        .expect("query assignments");
    assert_eq!(rows.len(), 1);

    app.drain_events().await;
    assert_eq!(app.sender.sent_to("u2@example.com").len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignee_sees_task_and_comments(app: App) {
    let task = app
        .engine
        .create_task(TaskDraft::new("Review API"), &admin())
        .await
        .expect("admin creates task");
    app.engine
        .assign(task.id(), &user_id("u1"), &admin())
        .await
        .expect("admin assigns u1");

    app.comments
        .add_comment(task.id(), "Started on this", Vec::new(), &member("u1"))
        .await
        .expect("assignee comments");
    let stranger = app.queries.get_task(task.id(), &member("u2")).await;
    let mine = app
        .queries
        .my_tasks(&member("u1"), None)
        .await
        .expect("list my tasks");
    let comments = app
        .comments
        .list_comments(task.id(), &member("u1"))
        .await
        .expect("list comments");

    assert!(matches!(stranger, Err(TaskServiceError::PermissionDenied(_))));
    assert_eq!(mine.len(), 1);
    assert_eq!(comments.len(), 1);
    assert!(app.bus.detail_types().contains(&"CommentAdded"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn change_feed_converges_index_after_delete(app: App) {
    let kept = app
        .engine
        .create_task(TaskDraft::new("Keep"), &admin())
        .await
        .expect("create kept");
    let dropped = app
        .engine
        .create_task(TaskDraft::new("Drop"), &admin())
        .await
        .expect("create dropped");
    app.engine
        .delete_task(dropped.id(), &admin())
        .await
        .expect("delete task");
    let mut worker = app.change_capture();

    let report = worker.poll_once().await.expect("poll feed");

    assert!(report.is_success());
    assert_eq!(report.deleted, 1);
    assert_eq!(app.index.count(SearchIndexName::Tasks), 1);
    assert!(
        app.index
            .document(SearchIndexName::Tasks, kept.id().as_str())
            .is_some()
    );
}
