//! Application services for credential verification and user queries.

mod gate;
mod users;

pub use gate::{GateError, IdentityConfig, IdentityGate, extract_bearer_token};
pub use users::{SignUpGuard, UserQueryService};
