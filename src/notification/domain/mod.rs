//! Notification messages, templates, and reports.

mod message;
mod report;

pub use message::{
    MessageTemplate, OutboundMessage, TASK_ASSIGNED, TASK_CLOSED, TASK_STATUS_UPDATED,
};
pub use report::{DispatchReport, FailedDelivery};
