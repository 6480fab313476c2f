//! In-memory identity adapters for tests and local runs.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::identity::{
    domain::{UserId, UserProfile},
    ports::{
        DirectoryError, DirectoryResult, KeySourceError, KeySourceResult, SigningKeySource,
        UserDirectory,
    },
};

/// Thread-safe in-memory user directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory seeded with the given profiles.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = UserProfile>) -> Self {
        let directory = Self::new();
        for user in users {
            directory.upsert(user);
        }
        directory
    }

    /// Inserts or replaces a profile.
    pub fn upsert(&self, user: UserProfile) {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.user_id.clone(), user);
        }
    }

    /// Makes every subsequent lookup fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> DirectoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::unavailable(std::io::Error::other(
                "directory marked unavailable",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> DirectoryResult<Option<UserProfile>> {
        self.check_available()?;
        let users = self
            .users
            .read()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        Ok(users.get(user_id).cloned())
    }

    async fn list_users(&self) -> DirectoryResult<Vec<UserProfile>> {
        self.check_available()?;
        let users = self
            .users
            .read()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        let mut listed: Vec<UserProfile> = users.values().cloned().collect();
        listed.sort_by(|left, right| left.user_id.cmp(&right.user_id));
        Ok(listed)
    }
}

/// Signing-key source serving a fixed key set.
///
/// Counts fetches so cache behaviour can be asserted.
#[derive(Debug, Clone)]
pub struct StaticKeySource {
    keys: Arc<RwLock<JwkSet>>,
    fetches: Arc<AtomicUsize>,
}

impl StaticKeySource {
    /// Creates a source serving `keys`.
    #[must_use]
    pub fn new(keys: JwkSet) -> Self {
        Self {
            keys: Arc::new(RwLock::new(keys)),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replaces the served key set, simulating key rotation.
    pub fn rotate(&self, keys: JwkSet) {
        if let Ok(mut current) = self.keys.write() {
            *current = keys;
        }
    }

    /// Returns how many times the keys were fetched.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SigningKeySource for StaticKeySource {
    async fn fetch(&self) -> KeySourceResult<JwkSet> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let keys = self
            .keys
            .read()
            .map_err(|err| KeySourceError::Malformed(err.to_string()))?;
        Ok(keys.clone())
    }
}
