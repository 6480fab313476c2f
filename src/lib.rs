//! Tasklane: task lifecycle, assignment, and event fan-out.
//!
//! Admins create and assign tasks; assignees move them through their
//! workflow; every committed change is announced as a domain event that
//! keeps the search index current and notifies the people involved.
//! Repository activity arrives through signed webhooks and is applied as a
//! system actor.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, providers)
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`store`]: Keyed single-table persistence with conditional writes
//! - [`task`]: Task mutation engine, queries, and collaboration
//! - [`events`]: Domain events and the publisher
//! - [`indexer`]: Change-capture search indexing
//! - [`notification`]: Templated notifications for task events
//! - [`identity`]: Bearer credential verification and the user directory
//! - [`trigger`]: Signed repository webhooks
//! - [`pipeline`]: Background workers for indexing and notifications
//! - [`api`]: Request and response bodies of the HTTP surface
//! - [`config`] and [`telemetry`]: Process configuration and logging

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod indexer;
pub mod notification;
pub mod pipeline;
pub mod store;
pub mod task;
pub mod telemetry;
pub mod trigger;

#[cfg(test)]
mod test_support;
