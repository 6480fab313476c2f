//! Adapter implementations for identity ports.

pub mod http;
pub mod memory;

pub use http::HttpJwksSource;
pub use memory::{InMemoryUserDirectory, StaticKeySource};
