//! Webhook handling services.

mod adapter;

pub use adapter::{
    ExternalTriggerAdapter, REPOSITORY_ACTOR, TriggerError, TriggerFailure, TriggerReport,
};
