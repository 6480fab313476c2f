//! Change-capture indexer.
//!
//! Mirrors tasks, comments, and projects into a search index from two
//! inputs: the store's change log and published domain events. Both paths
//! converge on idempotent upserts keyed by entity id, so replays and
//! duplicate deliveries are harmless.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
