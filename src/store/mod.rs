//! Persistent user store.
//!
//! One record per Telegram user id, tracking registration time, block
//! status and the consecutive failed-attempt counter.

mod sqlite;

pub use sqlite::SqliteUserStore;

use std::sync::Arc;

use crate::models::{UserRecord, UserSummary};

/// Failed verification responses allowed before an identity is blocked.
pub const BLOCK_THRESHOLD: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Storage operations the verification engine depends on.
///
/// Implementations must linearize calls for the same user id; the
/// read-modify-write inside [`record_attempt`](UserStore::record_attempt)
/// is the one correctness-critical operation.
pub trait UserStore: Send + Sync {
    /// Fetch the current record, if any. No side effects.
    fn get(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;

    /// Create or overwrite the record with `blocked = false, attempts = 0`
    /// and a fresh registration timestamp. Used only on successful
    /// verification.
    fn upsert_registered(&self, id: i64, username: &str) -> Result<(), StoreError>;

    /// Atomically account for one challenge response.
    ///
    /// Creates the record if absent (username defaults to "unknown").
    /// On success the attempt counter resets to 0 without touching the
    /// block flag; on failure it increments, and the identity is blocked
    /// once it reaches [`BLOCK_THRESHOLD`].
    fn record_attempt(&self, id: i64, username: Option<&str>, success: bool)
        -> Result<(), StoreError>;

    /// All users in storage order, one row per record.
    fn list_all(&self) -> Result<Vec<UserSummary>, StoreError>;

    /// False when no record exists.
    fn is_blocked(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.get(id)?.map(|record| record.blocked).unwrap_or(false))
    }
}

impl<S: UserStore + ?Sized> UserStore for Arc<S> {
    fn get(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        (**self).get(id)
    }

    fn upsert_registered(&self, id: i64, username: &str) -> Result<(), StoreError> {
        (**self).upsert_registered(id, username)
    }

    fn record_attempt(
        &self,
        id: i64,
        username: Option<&str>,
        success: bool,
    ) -> Result<(), StoreError> {
        (**self).record_attempt(id, username, success)
    }

    fn list_all(&self) -> Result<Vec<UserSummary>, StoreError> {
        (**self).list_all()
    }

    fn is_blocked(&self, id: i64) -> Result<bool, StoreError> {
        (**self).is_blocked(id)
    }
}
