//! Task domain validation tests.

use crate::task::domain::{
    AttachmentId, AttachmentPolicy, Comment, ParseTaskStatusError, Priority, ProjectDraft, Project, Sprint,
    SprintDraft, Task, TaskChanges, TaskDomainError, TaskDraft, TaskId, TaskPatch, TaskStatus,
};
use crate::test_support::{SteppingClock, task_id, user};
use chrono::Duration;
use mockable::Clock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> SteppingClock {
    SteppingClock::new()
}

#[rstest]
#[case("OPEN", TaskStatus::Open)]
#[case("in_progress", TaskStatus::InProgress)]
#[case(" In_Review ", TaskStatus::InReview)]
#[case("completed", TaskStatus::Completed)]
#[case("Closed", TaskStatus::Closed)]
#[case("blocked", TaskStatus::Blocked)]
fn statuses_parse_case_insensitively(#[case] raw: &str, #[case] expected: TaskStatus) {
    assert_eq!(TaskStatus::try_from(raw), Ok(expected));
    assert_eq!(expected.as_str().parse::<TaskStatus>(), Ok(expected));
}

#[rstest]
fn unknown_status_reports_input() {
    let err = TaskStatus::try_from("DONE").expect_err("unknown status");
    assert_eq!(err, ParseTaskStatusError("DONE".to_owned()));
    assert_eq!(err.to_string(), "Invalid status: DONE");
}

#[rstest]
fn only_closed_is_terminal() {
    let terminal: Vec<TaskStatus> = TaskStatus::ALL
        .into_iter()
        .filter(|status| status.is_terminal())
        .collect();
    assert_eq!(terminal, [TaskStatus::Closed]);
}

#[rstest]
#[case("", false)]
#[case("  ", false)]
#[case("TASK#1", false)]
#[case("123", true)]
#[case(" abc-1 ", true)]
fn task_ids_reject_blank_and_separator(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(TaskId::new(raw).is_ok(), valid);
}

#[rstest]
fn new_tasks_start_open_with_trimmed_title(clock: SteppingClock) {
    let task = Task::create(
        TaskDraft::new("  Ship  ").with_priority(Priority::Critical),
        user("admin"),
        &clock,
    )
    .expect("valid task");

    assert_eq!(task.title(), "Ship");
    assert_eq!(task.status(), TaskStatus::Open);
    assert_eq!(task.priority(), Priority::Critical);
    assert_eq!(task.created_at(), task.updated_at());
    assert!(task.updated_by().is_none());
}

#[rstest]
fn default_priority_is_medium(clock: SteppingClock) {
    let task = Task::create(TaskDraft::new("Plain"), user("admin"), &clock).expect("valid task");
    assert_eq!(task.priority(), Priority::Medium);
}

#[rstest]
fn closing_through_status_update_is_refused(clock: SteppingClock) {
    let result = TaskChanges::status(TaskStatus::Closed, user("admin"), clock.utc());
    assert_eq!(result, Err(TaskDomainError::CloseThroughStatusUpdate));
}

#[rstest]
fn close_change_stamps_closure_fields(clock: SteppingClock) {
    let mut task = Task::create(TaskDraft::new("Wrap up"), user("admin"), &clock)
        .expect("valid task");
    let at = clock.utc();

    task.apply_changes(&TaskChanges::close(user("admin"), at));

    assert_eq!(task.status(), TaskStatus::Closed);
    assert_eq!(task.closed_by(), Some(&user("admin")));
    assert_eq!(task.closed_at(), Some(at));
    assert_eq!(task.updated_at(), at);
}

#[rstest]
fn patch_reports_only_set_fields() {
    let patch = TaskPatch {
        description: Some("Details".to_owned()),
        estimated_points: Some(3),
        ..TaskPatch::default()
    };
    assert_eq!(patch.field_names(), ["description", "estimatedPoints"]);
    assert!(TaskPatch::default().field_names().is_empty());
}

#[rstest]
fn task_serializes_with_wire_names(clock: SteppingClock) {
    let task = Task::create_with_id(task_id("t-1"), TaskDraft::new("Wire"), user("admin"), &clock)
        .expect("valid task");

    let json = serde_json::to_value(&task).expect("serialize task");

    assert_eq!(json["taskId"], "t-1");
    assert_eq!(json["status"], "OPEN");
    assert_eq!(json["priority"], "MEDIUM");
    assert_eq!(json["createdBy"], "admin");
}

#[rstest]
fn comments_trim_content_and_deduplicate_mentions(clock: SteppingClock) {
    let comment = Comment::new(
        task_id("t-1"),
        user("u1"),
        "  looks good  ",
        vec![user("u2"), user("u3"), user("u2")],
        &clock,
    )
    .expect("valid comment");

    assert_eq!(comment.content(), "looks good");
    assert_eq!(comment.mentions(), [user("u2"), user("u3")]);
}

#[rstest]
#[case("image/png", 1024, None)]
#[case("IMAGE/JPEG", 1024, None)]
#[case("application/zip", 1024, Some("file type not allowed: application/zip"))]
#[case(
    "application/pdf",
    AttachmentPolicy::DEFAULT_MAX_SIZE_BYTES + 1,
    Some("file too large: 10485761 bytes exceeds the 10485760 byte limit")
)]
fn attachment_policy_checks_type_then_size(
    #[case] content_type: &str,
    #[case] size: u64,
    #[case] expected: Option<&str>,
) {
    let result = AttachmentPolicy::default().check(content_type, size);
    assert_eq!(result.err().map(|err| err.to_string()).as_deref(), expected);
}

#[rstest]
fn project_keys_are_upper_cased_and_required(clock: SteppingClock) {
    let project = Project::create(ProjectDraft::new(" web ", "Website"), &clock)
        .expect("valid project");
    let blank = Project::create(ProjectDraft::new("", "Nameless"), &clock);

    assert_eq!(project.key(), "WEB");
    assert_eq!(blank, Err(TaskDomainError::EmptyProjectField("key")));
}

#[rstest]
fn sprints_reject_inverted_dates(clock: SteppingClock) {
    let start = clock.utc();
    let result = Sprint::create(
        SprintDraft::new("Backwards").with_dates(start, start - Duration::days(1)),
        &clock,
    );
    assert_eq!(result, Err(TaskDomainError::InvertedSprintDates));
}

#[test]
fn attachment_ids_follow_the_object_location() {
    let first = AttachmentId::for_object("uploads", "tasks/t-1/design.pdf");

    assert_eq!(
        first,
        AttachmentId::for_object("uploads", "tasks/t-1/design.pdf")
    );
    assert_ne!(first, AttachmentId::for_object("archive", "tasks/t-1/design.pdf"));
    assert_ne!(first, AttachmentId::for_object("uploads", "tasks/t-2/design.pdf"));
}
