//! Notification services.

mod dispatcher;

pub use dispatcher::{NotificationDispatcher, NotificationError};
