//! Ports for event delivery.

mod bus;

pub use bus::{EventBus, EventBusError, EventBusResult};
