use serde::Serialize;

/// User record created on first challenge attempt or first successful
/// verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    /// Telegram user id
    pub id: i64,
    /// Last-seen username ("unknown" when the platform reports none)
    pub username: String,
    /// When the record was created or the user last verified (`%Y-%m-%d %H:%M:%S`)
    pub registered_at: String,
    /// Whether the user is denied further verification
    pub blocked: bool,
    /// Consecutive failed verification responses since the last success
    pub attempts: u32,
}

/// Row returned by the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub registered_at: String,
    pub blocked: bool,
}

/// Verification state of an identity, derived from its stored record.
///
/// The challenged phase is transient: it lives only in the callback payload
/// attached to an outgoing captcha keyboard, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    /// No record exists; first contact issues a challenge.
    Unknown,
    /// Record exists and is not blocked.
    Registered,
    /// Terminal denial after repeated failures.
    Blocked,
}

impl IdentityState {
    pub fn of(record: Option<&UserRecord>) -> Self {
        match record {
            None => IdentityState::Unknown,
            Some(record) if record.blocked => IdentityState::Blocked,
            Some(_) => IdentityState::Registered,
        }
    }
}
