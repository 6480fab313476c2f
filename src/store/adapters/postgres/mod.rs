//! `PostgreSQL` adapter for the keyed store.

mod models;
mod schema;
mod store;

pub use store::{PostgresKeyedStore, StorePgPool};
