//! When steps for task lifecycle BDD scenarios.

use super::world::{LifecycleWorld, admin, run_async, user_id};
use rstest_bdd_macros::when;
use tasklane::identity::domain::Actor;
use tasklane::task::domain::TaskDraft;

#[when(r#"the admin assigns the task to "{assignee}""#)]
fn admin_assigns(world: &mut LifecycleWorld, assignee: String) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?.id().clone();
    let result = run_async(world.engine.assign(&task_id, &user_id(&assignee), &admin()));
    world.record(result);
    Ok(())
}

#[when(r#""{member}" updates the task status to "{status}""#)]
fn member_updates_status(
    world: &mut LifecycleWorld,
    member: String,
    status: String,
) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?.id().clone();
    let actor = Actor::member(user_id(&member));
    let result = run_async(world.engine.update_status(&task_id, &status, &actor));
    if let Some(updated) = world.record(result) {
        world.task = Some(updated);
    }
    Ok(())
}

#[when("the admin closes the task")]
fn admin_closes(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?.id().clone();
    let result = run_async(world.engine.close(&task_id, &admin()));
    if let Some(closed) = world.record(result) {
        world.task = Some(closed);
    }
    Ok(())
}

#[when(r#"member "{member}" creates a task titled "{title}""#)]
fn member_creates(world: &mut LifecycleWorld, member: String, title: String) {
    let actor = Actor::member(user_id(&member));
    let result = run_async(world.engine.create_task(TaskDraft::new(title), &actor));
    if let Some(created) = world.record(result) {
        world.task = Some(created);
    }
}
