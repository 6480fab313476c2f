//! Event bus adapters.

pub mod memory;
