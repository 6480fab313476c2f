//! Outbound messages and their templates.

use serde::Serialize;

/// A rendered message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// Delivery address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Subject and body templates for one notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTemplate {
    /// `minijinja` template for the subject line.
    pub subject: &'static str,
    /// `minijinja` template for the body.
    pub body: &'static str,
    /// Actor label used when the actor has no known address.
    pub fallback_actor: &'static str,
}

/// Sent to a newly assigned user.
pub const TASK_ASSIGNED: MessageTemplate = MessageTemplate {
    subject: "New Task Assigned: {{ title }}",
    body: "You have been assigned a new task:\n\n\
           Task: {{ title }}\n\
           Priority: {{ priority }}\n\
           Assigned by: {{ actor }}",
    fallback_actor: "Admin",
};

/// Sent to the creator and assignees when status changes.
pub const TASK_STATUS_UPDATED: MessageTemplate = MessageTemplate {
    subject: "Task Status Updated: {{ title }}",
    body: "Task status has been updated:\n\n\
           Task: {{ title }}\n\
           Previous Status: {{ previous_status }}\n\
           New Status: {{ new_status }}\n\
           Updated by: {{ actor }}",
    fallback_actor: "User",
};

/// Sent to assignees when a task is closed.
pub const TASK_CLOSED: MessageTemplate = MessageTemplate {
    subject: "Task Closed: {{ title }}",
    body: "A task you were assigned to has been closed:\n\n\
           Task: {{ title }}\n\
           Final Status: {{ final_status }}\n\
           Closed by: {{ actor }}",
    fallback_actor: "Admin",
};
