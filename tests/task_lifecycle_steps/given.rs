//! Given steps for task lifecycle BDD scenarios.

use super::world::{LifecycleWorld, admin, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasklane::task::domain::{Priority, TaskDraft};

#[given(r#"an admin has created a task titled "{title}" with priority "{priority}""#)]
fn admin_created_task(
    world: &mut LifecycleWorld,
    title: String,
    priority: String,
) -> Result<(), eyre::Report> {
    let level = Priority::try_from(priority.as_str())
        .map_err(|err| eyre::eyre!("invalid priority in scenario: {err}"))?;
    let created = run_async(
        world
            .engine
            .create_task(TaskDraft::new(title).with_priority(level), &admin()),
    )
    .wrap_err("create task for lifecycle scenario")?;
    world.task = Some(created);
    Ok(())
}
