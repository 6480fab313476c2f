//! Ports for message delivery.

mod sender;

pub use sender::{DeliveryError, DeliveryResult, MessageSender};
