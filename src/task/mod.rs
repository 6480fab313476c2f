//! Task lifecycle and assignment.
//!
//! Administrators create, assign, and close tasks; assignees move task
//! status through the state machine in [`domain::TaskStatus`]. Every
//! mutation is a single conditional store write followed by a best-effort
//! event publish. The module follows the crate's hexagonal layout:
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]
//!
//! Persistence goes through [`crate::store::ports::KeyedStore`] and events
//! through [`crate::events::ports::EventBus`].

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
