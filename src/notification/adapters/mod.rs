//! Message delivery adapters.

pub mod memory;
