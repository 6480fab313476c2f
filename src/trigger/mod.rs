//! Repository activity as a source of task updates.
//!
//! Webhook deliveries are verified with a shared-secret HMAC, scanned for
//! task references, and applied through the mutation engine as a system
//! actor. Linkage metadata is always recorded; status moves only when a
//! keyword or pull-request action calls for one.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
