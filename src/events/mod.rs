//! Domain events emitted after committed task mutations.
//!
//! Events are published at most once per mutation, after the write has
//! committed. Publish failures never roll back or fail the mutation.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
