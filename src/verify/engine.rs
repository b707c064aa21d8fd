use crate::models::{IdentityState, UserSummary};
use crate::store::{StoreError, UserStore};

use super::challenge::{Challenge, EmojiCatalog};
use super::payload::{CallbackPayload, PayloadError};

/// Challenge/response state machine.
///
/// Stateless itself: everything durable lives in the user store, and the
/// in-flight challenge lives in the callback payload the transport carries.
pub struct VerificationEngine<S> {
    store: S,
    catalog: EmojiCatalog,
    admin_ids: Vec<i64>,
}

/// Outcome of a start event.
#[derive(Debug)]
pub enum StartOutcome {
    /// Start came from a non-private chat; ask the user to move to a
    /// private one instead of challenging.
    RedirectToPrivate,
    AlreadyRegistered,
    AlreadyBlocked,
    Challenge(Challenge),
}

/// Outcome of a challenge response.
#[derive(Debug)]
pub enum ResponseOutcome {
    Verified { user_id: i64 },
    /// Wrong choice; a brand-new challenge was issued.
    Retry(Challenge),
    /// This failure crossed the block threshold.
    NowBlocked,
    /// The identity was blocked before this response was evaluated.
    AlreadyBlocked,
}

/// Outcome of an admin list request.
#[derive(Debug)]
pub enum ListOutcome {
    Unauthorized,
    Users(Vec<UserSummary>),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
    #[error("Malformed payload: {0}")]
    Payload(#[from] PayloadError),
}

impl<S: UserStore> VerificationEngine<S> {
    pub fn new(store: S, catalog: EmojiCatalog, admin_ids: Vec<i64>) -> Self {
        Self {
            store,
            catalog,
            admin_ids,
        }
    }

    /// Handle a start event. Only an unknown identity in a private chat
    /// gets a challenge; terminal states report their status instead.
    pub fn start(
        &self,
        user_id: i64,
        username: &str,
        is_private: bool,
    ) -> Result<StartOutcome, StoreError> {
        if !is_private {
            return Ok(StartOutcome::RedirectToPrivate);
        }

        let record = self.store.get(user_id)?;
        match IdentityState::of(record.as_ref()) {
            IdentityState::Blocked => Ok(StartOutcome::AlreadyBlocked),
            IdentityState::Registered => Ok(StartOutcome::AlreadyRegistered),
            IdentityState::Unknown => {
                tracing::info!(user_id, username, "issuing captcha challenge");
                Ok(StartOutcome::Challenge(Challenge::issue(
                    &self.catalog,
                    user_id,
                    username,
                )))
            }
        }
    }

    /// Handle a challenge response carried in callback data.
    ///
    /// A blocked identity is rejected before the answer is even compared,
    /// so a correct choice cannot un-block anyone. Malformed payloads fail
    /// without touching the store.
    pub fn challenge_response(&self, data: &str) -> Result<ResponseOutcome, EngineError> {
        let payload = CallbackPayload::decode(data)?;

        if self.store.is_blocked(payload.user_id)? {
            return Ok(ResponseOutcome::AlreadyBlocked);
        }

        if payload.is_correct() {
            self.store
                .upsert_registered(payload.user_id, &payload.username)?;
            tracing::info!(user_id = payload.user_id, "user verified");
            return Ok(ResponseOutcome::Verified {
                user_id: payload.user_id,
            });
        }

        self.store
            .record_attempt(payload.user_id, Some(&payload.username), false)?;

        if self.store.is_blocked(payload.user_id)? {
            Ok(ResponseOutcome::NowBlocked)
        } else {
            Ok(ResponseOutcome::Retry(Challenge::issue(
                &self.catalog,
                payload.user_id,
                &payload.username,
            )))
        }
    }

    /// Handle an admin list request. Non-admins are denied before any
    /// store access.
    pub fn list(&self, requester: i64) -> Result<ListOutcome, StoreError> {
        if !self.admin_ids.contains(&requester) {
            tracing::warn!(user_id = requester, "unauthorized list request");
            return Ok(ListOutcome::Unauthorized);
        }
        Ok(ListOutcome::Users(self.store.list_all()?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_util::MemoryStore;

    const ADMIN: i64 = 1;

    fn engine(store: Arc<MemoryStore>) -> VerificationEngine<Arc<MemoryStore>> {
        VerificationEngine::new(store, EmojiCatalog::default(), vec![ADMIN])
    }

    fn correct_choice(challenge: &Challenge) -> String {
        challenge
            .choices
            .iter()
            .find(|c| c.symbol == challenge.target_symbol)
            .unwrap()
            .callback_data
            .clone()
    }

    fn wrong_choice(challenge: &Challenge) -> String {
        challenge
            .choices
            .iter()
            .find(|c| c.symbol != challenge.target_symbol)
            .unwrap()
            .callback_data
            .clone()
    }

    #[test]
    fn start_challenges_unknown_identity() {
        let engine = engine(Arc::new(MemoryStore::new()));

        match engine.start(42, "alice", true).unwrap() {
            StartOutcome::Challenge(challenge) => {
                assert_eq!(challenge.user_id, 42);
                assert_eq!(challenge.choices.len(), 9);
            }
            other => panic!("expected challenge, got {:?}", other),
        }
    }

    #[test]
    fn start_in_group_chat_redirects() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());

        assert!(matches!(
            engine.start(42, "alice", false).unwrap(),
            StartOutcome::RedirectToPrivate
        ));
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn start_reports_registered_status() {
        let store = Arc::new(MemoryStore::new());
        store.upsert_registered(42, "alice").unwrap();

        assert!(matches!(
            engine(store).start(42, "alice", true).unwrap(),
            StartOutcome::AlreadyRegistered
        ));
    }

    #[test]
    fn start_reports_blocked_status() {
        let store = Arc::new(MemoryStore::new());
        for _ in 0..3 {
            store.record_attempt(42, Some("alice"), false).unwrap();
        }

        assert!(matches!(
            engine(store).start(42, "alice", true).unwrap(),
            StartOutcome::AlreadyBlocked
        ));
    }

    #[test]
    fn correct_response_registers() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());

        let challenge = match engine.start(42, "alice", true).unwrap() {
            StartOutcome::Challenge(c) => c,
            other => panic!("expected challenge, got {:?}", other),
        };

        match engine.challenge_response(&correct_choice(&challenge)).unwrap() {
            ResponseOutcome::Verified { user_id } => assert_eq!(user_id, 42),
            other => panic!("expected verified, got {:?}", other),
        }

        let record = store.get(42).unwrap().unwrap();
        assert_eq!(record.attempts, 0);
        assert!(!record.blocked);
        assert!(!record.registered_at.is_empty());
    }

    #[test]
    fn wrong_response_reissues_fresh_challenge() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());

        let challenge = Challenge::issue(&EmojiCatalog::default(), 7, "bob");
        match engine.challenge_response(&wrong_choice(&challenge)).unwrap() {
            ResponseOutcome::Retry(next) => {
                assert_eq!(next.user_id, 7);
                assert_eq!(next.username, "bob");
            }
            other => panic!("expected retry, got {:?}", other),
        }
        assert_eq!(store.get(7).unwrap().unwrap().attempts, 1);
    }

    #[test]
    fn third_wrong_response_blocks() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());

        let challenge = Challenge::issue(&EmojiCatalog::default(), 7, "bob");
        for _ in 0..2 {
            assert!(matches!(
                engine.challenge_response(&wrong_choice(&challenge)).unwrap(),
                ResponseOutcome::Retry(_)
            ));
        }
        assert!(matches!(
            engine.challenge_response(&wrong_choice(&challenge)).unwrap(),
            ResponseOutcome::NowBlocked
        ));

        let record = store.get(7).unwrap().unwrap();
        assert_eq!(record.attempts, 3);
        assert!(record.blocked);
    }

    #[test]
    fn blocked_identity_cannot_verify_even_with_correct_answer() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());

        let challenge = Challenge::issue(&EmojiCatalog::default(), 7, "bob");
        for _ in 0..3 {
            engine.challenge_response(&wrong_choice(&challenge)).unwrap();
        }

        assert!(matches!(
            engine.challenge_response(&correct_choice(&challenge)).unwrap(),
            ResponseOutcome::AlreadyBlocked
        ));

        let record = store.get(7).unwrap().unwrap();
        assert_eq!(record.attempts, 3);
        assert!(record.blocked);
    }

    #[test]
    fn malformed_payload_does_not_touch_store() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());

        let err = engine.challenge_response("captcha_🐬_42").unwrap_err();
        assert!(matches!(err, EngineError::Payload(_)));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn list_requires_admin() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());

        assert!(matches!(
            engine.list(999).unwrap(),
            ListOutcome::Unauthorized
        ));
        assert_eq!(store.list_calls(), 0);
    }

    #[test]
    fn list_returns_rows_for_admin() {
        let store = Arc::new(MemoryStore::new());
        store.upsert_registered(42, "alice").unwrap();
        let engine = engine(store.clone());

        match engine.list(ADMIN).unwrap() {
            ListOutcome::Users(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].id, 42);
            }
            other => panic!("expected rows, got {:?}", other),
        }
        assert_eq!(store.list_calls(), 1);
    }
}
