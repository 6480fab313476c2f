//! Authorization and identity gate.
//!
//! Verifies bearer credentials against the identity provider's published
//! signing keys and resolves the [`domain::Actor`] that mutation services
//! receive. Layout follows the crate's hexagonal convention:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
