//! Event publishing services.

mod publisher;

pub use publisher::{EventPublisher, PublishError};
