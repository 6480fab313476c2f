//! Request and response bodies driven through the services.

use crate::in_memory::helpers::{App, admin, app, member};
use tasklane::api::{AssignBody, CreateTaskBody, ListTasksQuery, TaskListResponse, UpdateStatusBody};
use tasklane::error::ApiError;
use tasklane::task::domain::TaskDraft;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn json_bodies_drive_the_engine(app: App) {
    let create: CreateTaskBody = serde_json::from_value(json!({
        "title": "From JSON",
        "priority": "CRITICAL",
        "labels": ["api"]
    }))
    .expect("decode create body");
    let task = app
        .engine
        .create_task(create.into_draft(), &admin())
        .await
        .expect("create task");

    let assign: AssignBody =
        serde_json::from_value(json!({"userId": "u1"})).expect("decode assign body");
    app.engine
        .assign(task.id(), &assign.assignee().expect("valid assignee"), &admin())
        .await
        .expect("assign task");

    let status: UpdateStatusBody =
        serde_json::from_value(json!({"status": "IN_REVIEW"})).expect("decode status body");
    let updated = app
        .engine
        .update_status(task.id(), &status.status, &member("u1"))
        .await
        .expect("update status");

    let encoded = serde_json::to_value(&updated).expect("encode task");
    assert_eq!(encoded["status"], "IN_REVIEW");
    assert_eq!(encoded["priority"], "CRITICAL");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_pages_follow_next_token(app: App) {
    for n in 0..3 {
        app.engine
            .create_task(TaskDraft::new(format!("Task {n}")), &admin())
            .await
            .expect("create task");
    }
    let first_query: ListTasksQuery =
        serde_json::from_value(json!({"status": "OPEN", "limit": 2})).expect("decode query");

    let first = app
        .queries
        .list_tasks(
            first_query.filter().expect("valid filter"),
            &first_query.page(),
            &admin(),
        )
        .await
        .expect("first page");
    let first_body = TaskListResponse::from(first);
    let token = first_body.next_token.clone().expect("more pages");
    let second_query = ListTasksQuery {
        next_token: Some(token),
        ..first_query
    };
    let second = app
        .queries
        .list_tasks(
            second_query.filter().expect("valid filter"),
            &second_query.page(),
            &admin(),
        )
        .await
        .expect("second page");

    assert_eq!(first_body.tasks.len(), 2);
    assert_eq!(second.items.len(), 1);
    assert!(second.next.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn permission_failures_map_to_forbidden(app: App) {
    let create: CreateTaskBody =
        serde_json::from_value(json!({"title": "Nope"})).expect("decode create body");

    let err = app
        .engine
        .create_task(create.into_draft(), &member("u1"))
        .await
        .expect_err("member cannot create");
    let body = ApiError::from(err);

    assert_eq!(body.status, 403);
    assert_eq!(
        serde_json::to_value(&body).expect("encode error"),
        json!({"message": "Only admins can create tasks"})
    );
}

#[rstest]
fn unknown_status_filter_is_a_bad_request() {
    let query: ListTasksQuery =
        serde_json::from_value(json!({"status": "LATER"})).expect("decode query");

    let Err(err) = query.filter() else {
        panic!("unknown status should be rejected");
    };
    assert_eq!(err.status, 400);
}
