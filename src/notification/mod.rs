//! Notification dispatcher.
//!
//! Consumes task events and emails the users they concern: the assignee
//! on assignment, the creator and assignees on a status change, and the
//! assignees on closure.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
