//! Domain model for authenticated identities.
//!
//! Users are owned by the external identity provider; this module only
//! models what the rest of the crate needs from them: subject identifiers,
//! resolved roles, and directory records used for notifications and
//! assignment checks.

mod actor;
mod error;
mod signup;
mod user;

pub use actor::{Actor, ActorKind};
pub use error::IdentityDomainError;
pub use signup::SignUpPolicy;
pub use user::{AccountStatus, UserId, UserProfile};
