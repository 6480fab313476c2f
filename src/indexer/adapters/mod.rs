//! Search index adapters.

pub mod memory;
