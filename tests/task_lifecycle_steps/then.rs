//! Then steps for task lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use rstest_bdd_macros::then;
use tasklane::error::ErrorKind;
use tasklane::events::domain::DomainEvent;
use tasklane::task::domain::TaskStatus;

#[then(r#"a "{detail_type}" event is published"#)]
fn event_published(world: &LifecycleWorld, detail_type: String) -> Result<(), eyre::Report> {
    let published = world.bus.detail_types();
    if !published.contains(&detail_type.as_str()) {
        return Err(eyre::eyre!(
            "expected a {detail_type} event, published {published:?}"
        ));
    }
    Ok(())
}

#[then(r#"the status update reports previous status "{previous}""#)]
fn status_update_reports_previous(
    world: &LifecycleWorld,
    previous: String,
) -> Result<(), eyre::Report> {
    if let Some(err) = &world.last_error {
        return Err(eyre::eyre!("status update failed: {err}"));
    }
    let expected = TaskStatus::try_from(previous.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let reported = world
        .bus
        .published()
        .into_iter()
        .rev()
        .find_map(|envelope| match envelope.event() {
            DomainEvent::TaskStatusUpdated(detail) => Some(detail.previous_status),
            _ => None,
        })
        .ok_or_else(|| eyre::eyre!("no TaskStatusUpdated event was published"))?;
    if reported != expected {
        return Err(eyre::eyre!(
            "expected previous status {expected}, event reported {reported}"
        ));
    }
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &LifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let actual = world.current_task()?.status();
    if actual != expected {
        return Err(eyre::eyre!("expected status {expected}, found {actual}"));
    }
    Ok(())
}

#[then(r#"the request fails with a "{kind}" error"#)]
fn request_fails_with(world: &LifecycleWorld, kind: String) -> Result<(), eyre::Report> {
    let expected: ErrorKind = serde_json::from_value(serde_json::Value::String(kind))
        .map_err(|err| eyre::eyre!("invalid error kind in scenario: {err}"))?;
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the last request to fail"))?;
    if err.kind() != expected {
        return Err(eyre::eyre!("expected a {expected} error, got {err:?}"));
    }
    Ok(())
}

#[then("no task is stored")]
fn no_task_stored(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    if !world.store.is_empty() {
        return Err(eyre::eyre!("expected an empty store, found {} items", world.store.len()));
    }
    Ok(())
}

#[then("no event is published")]
fn no_event_published(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let published = world.bus.detail_types();
    if !published.is_empty() {
        return Err(eyre::eyre!("expected no events, published {published:?}"));
    }
    Ok(())
}

#[then(r#""{member}" is notified of exactly one assignment"#)]
fn notified_once(world: &LifecycleWorld, member: String) -> Result<(), eyre::Report> {
    for envelope in world.bus.published() {
        run_async(world.dispatcher.dispatch(&envelope))
            .map_err(|err| eyre::eyre!("dispatch failed: {err}"))?;
    }
    let address = format!("{member}@example.com");
    let assignments = world
        .sender
        .sent_to(&address)
        .into_iter()
        .filter(|message| message.subject.starts_with("New Task Assigned"))
        .count();
    if assignments != 1 {
        return Err(eyre::eyre!(
            "expected one assignment notice for {address}, found {assignments}"
        ));
    }
    Ok(())
}
