pub mod user;

pub use user::{IdentityState, UserRecord, UserSummary};
