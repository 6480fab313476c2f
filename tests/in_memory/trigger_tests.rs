//! Repository webhooks applied end to end.

use crate::in_memory::helpers::{App, WEBHOOK_SECRET, app, user_id};
use tasklane::config::WebhookConfig;
use tasklane::error::ApiError;
use tasklane::events::domain::REPOSITORY_TRIGGER_SOURCE;
use tasklane::store::{
    domain::{Entity, ItemKey, WriteCondition},
    ports::KeyedStore,
};
use tasklane::task::domain::{Task, TaskDraft, TaskId, TaskStatus};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;

async fn seed(app: &App, raw_id: &str) -> TaskId {
    let task = Task::create_with_id(
        TaskId::new(raw_id).expect("valid task id"),
        TaskDraft::new("Login form"),
        user_id("admin"),
        &DefaultClock,
    )
    .expect("valid task");
    app.store
        .put(Entity::Task(task.clone()), Some(WriteCondition::NotExists))
        .await
        .expect("seed task");
    task.id().clone()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merged_pull_request_completes_task_and_notifies_creator(app: App) {
    let id = seed(&app, "101").await;
    let body = serde_json::to_vec(&json!({
        "action": "closed",
        "repository": {"full_name": "acme/app"},
        "pull_request": {
            "number": 8,
            "title": "Login form",
            "body": "Closes TASK-101",
            "html_url": "https://git.example.com/acme/app/pull/8",
            "state": "closed",
            "merged": true,
            "head": {"ref": "feature/login"}
        }
    }))
    .expect("encode payload");
    let signature = WebhookConfig::new(WEBHOOK_SECRET).verifier().sign(&body);

    let report = app
        .trigger
        .handle("pull_request", Some(&signature), &body)
        .await
        .expect("delivery accepted");
    app.drain_events().await;

    assert_eq!(report.updated, [id.clone()]);
    let task = app
        .store
        .get(&ItemKey::task(&id))
        .await
        .expect("read task")
        .and_then(Entity::into_task)
        .expect("task present");
    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(task.pr_number(), Some(8));
    assert!(
        app.bus
            .published()
            .iter()
            .all(|envelope| envelope.source() == REPOSITORY_TRIGGER_SOURCE)
    );
    let subjects: Vec<String> = app
        .sender
        .sent_to("admin@example.com")
        .into_iter()
        .map(|message| message.subject)
        .collect();
    assert_eq!(subjects, ["Task Status Updated: Login form"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forged_webhook_changes_nothing(app: App) {
    let id = seed(&app, "102").await;
    let body = br#"{"ref":"refs/heads/main","repository":{"full_name":"acme/app"},"commits":[]}"#;
    let forged = WebhookConfig::new("not-the-secret").verifier().sign(body);

    let result = app.trigger.handle("push", Some(&forged), body).await;

    let Err(err) = result else {
        panic!("forged signature should be rejected");
    };
    assert_eq!(ApiError::from(err).status, 401);
    assert!(app.bus.published().is_empty());
    let unchanged = app
        .store
        .get(&ItemKey::task(&id))
        .await
        .expect("read task")
        .and_then(Entity::into_task)
        .expect("task present");
    assert_eq!(unchanged.status(), TaskStatus::Open);
}
