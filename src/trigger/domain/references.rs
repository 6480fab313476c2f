//! Task references and status keywords in free text.

use crate::task::domain::{TaskId, TaskStatus};
use regex::Regex;
use std::sync::LazyLock;

const REFERENCE_PATTERNS: [&str; 3] = [r"(?i)TASK-(\d+)", r"#(\d+)", r"(?i)TM-(\d+)"];

static REFERENCES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    REFERENCE_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Extracts referenced task ids from `text`.
///
/// Patterns are applied in the order `TASK-<n>`, `#<n>`, `TM-<n>`; the
/// result keeps the first occurrence of each number.
#[must_use]
pub fn extract_task_refs(text: &str) -> Vec<TaskId> {
    let mut found: Vec<TaskId> = Vec::new();
    for pattern in REFERENCES.iter() {
        for number in pattern
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
        {
            let Ok(task_id) = TaskId::new(number.as_str()) else {
                continue;
            };
            if !found.contains(&task_id) {
                found.push(task_id);
            }
        }
    }
    found
}

/// Derives a status from commit or pull-request keywords.
///
/// Completion keywords win over progress keywords, which win over
/// `[blocked]`.
#[must_use]
pub fn status_from_keywords(text: &str) -> Option<TaskStatus> {
    let lowered = text.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|keyword| lowered.contains(keyword));
    if has_any(&["[completed]", "fixes", "closes"]) {
        Some(TaskStatus::Completed)
    } else if has_any(&["[in progress]", "wip"]) {
        Some(TaskStatus::InProgress)
    } else if has_any(&["[blocked]"]) {
        Some(TaskStatus::Blocked)
    } else {
        None
    }
}
