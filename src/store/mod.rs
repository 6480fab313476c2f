//! Keyed persistent store.
//!
//! A single-item key/value store with conditional writes, secondary indexes
//! derived from typed records, cursor pagination, and a change log. The
//! module follows the crate's hexagonal layout:
//!
//! - Keys, entities, and query types in [`domain`]
//! - The [`ports::KeyedStore`] and [`ports::ChangeFeed`] contracts in [`ports`]
//! - In-memory, `PostgreSQL`, and retrying implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
