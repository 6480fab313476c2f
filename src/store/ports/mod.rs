//! Port contracts for the keyed store.

mod keyed_store;

pub use keyed_store::{ChangeFeed, KeyedStore, StoreError, StoreResult};
