//! Adapter implementations of the keyed store port.

pub mod memory;
pub mod postgres;
pub mod retry;
