//! Port contracts for identity resolution.

pub mod directory;
pub mod key_source;

pub use directory::{DirectoryError, DirectoryResult, UserDirectory};
pub use key_source::{KeySourceError, KeySourceResult, SigningKeySource};
