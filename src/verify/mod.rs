//! Verification engine.
//!
//! This module provides:
//! - The emoji catalog and per-issue challenge construction
//! - The callback payload codec carried by captcha keyboard buttons
//! - The challenge/response state machine over the user store

mod challenge;
mod engine;
mod payload;

pub use challenge::{CatalogEntry, Challenge, ChallengeChoice, EmojiCatalog};
pub use engine::{
    EngineError, ListOutcome, ResponseOutcome, StartOutcome, VerificationEngine,
};
pub use payload::{CallbackPayload, PayloadError, PAYLOAD_PREFIX};
