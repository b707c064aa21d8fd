//! Shared test fixtures: an in-memory user store double and update builders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{UserRecord, UserSummary};
use crate::store::{StoreError, UserStore, BLOCK_THRESHOLD};
use crate::telegram::types::{CallbackQuery, Chat, Message, TgUser, Update};

/// In-memory [`UserStore`] double with the same transition semantics as the
/// SQLite store. Counts `list_all` invocations so tests can assert the
/// store is never touched on unauthorized list requests.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRecord>>,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<UserRecord>>, StoreError> {
        self.users
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl UserStore for MemoryStore {
    fn get(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock()?.iter().find(|u| u.id == id).cloned())
    }

    fn upsert_registered(&self, id: i64, username: &str) -> Result<(), StoreError> {
        let mut users = self.lock()?;
        let record = UserRecord {
            id,
            username: username.to_string(),
            registered_at: "2026-01-01 00:00:00".to_string(),
            blocked: false,
            attempts: 0,
        };
        match users.iter_mut().find(|u| u.id == id) {
            Some(existing) => *existing = record,
            None => users.push(record),
        }
        Ok(())
    }

    fn record_attempt(
        &self,
        id: i64,
        username: Option<&str>,
        success: bool,
    ) -> Result<(), StoreError> {
        let mut users = self.lock()?;
        if !users.iter().any(|u| u.id == id) {
            users.push(UserRecord {
                id,
                username: username.unwrap_or("unknown").to_string(),
                registered_at: "2026-01-01 00:00:00".to_string(),
                blocked: false,
                attempts: 0,
            });
        }
        let record = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::Database("record vanished".to_string()))?;

        if success {
            record.attempts = 0;
        } else {
            record.attempts += 1;
            if record.attempts >= BLOCK_THRESHOLD {
                record.blocked = true;
            }
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<UserSummary>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lock()?
            .iter()
            .map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
                registered_at: u.registered_at.clone(),
                blocked: u.blocked,
            })
            .collect())
    }
}

/// Store double whose every operation fails, for exercising
/// storage-failure paths.
pub struct FailingStore;

impl FailingStore {
    fn fail<T>() -> Result<T, StoreError> {
        Err(StoreError::Database("simulated storage failure".to_string()))
    }
}

impl UserStore for FailingStore {
    fn get(&self, _id: i64) -> Result<Option<UserRecord>, StoreError> {
        Self::fail()
    }

    fn upsert_registered(&self, _id: i64, _username: &str) -> Result<(), StoreError> {
        Self::fail()
    }

    fn record_attempt(
        &self,
        _id: i64,
        _username: Option<&str>,
        _success: bool,
    ) -> Result<(), StoreError> {
        Self::fail()
    }

    fn list_all(&self) -> Result<Vec<UserSummary>, StoreError> {
        Self::fail()
    }
}

/// Build a text-message update in a chat of the given kind.
pub fn message_update(user_id: i64, username: Option<&str>, chat_kind: &str, text: &str) -> Update {
    Update {
        update_id: 1,
        message: Some(Message {
            message_id: 1,
            chat: Chat {
                id: user_id,
                kind: chat_kind.to_string(),
            },
            from: Some(TgUser {
                id: user_id,
                username: username.map(String::from),
            }),
            text: Some(text.to_string()),
        }),
        callback_query: None,
    }
}

/// Build a captcha-button callback update in a private chat.
pub fn callback_update(user_id: i64, username: Option<&str>, data: &str) -> Update {
    Update {
        update_id: 1,
        message: None,
        callback_query: Some(CallbackQuery {
            id: "cb1".to_string(),
            from: TgUser {
                id: user_id,
                username: username.map(String::from),
            },
            message: Some(Message {
                message_id: 1,
                chat: Chat {
                    id: user_id,
                    kind: "private".to_string(),
                },
                from: None,
                text: None,
            }),
            data: Some(data.to_string()),
        }),
    }
}
