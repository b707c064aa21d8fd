pub mod config;
pub mod handlers;
pub mod models;
pub mod store;
pub mod telegram;
pub mod test_util;
pub mod verify;

pub use config::Config;
pub use handlers::BotHandler;
pub use models::{IdentityState, UserRecord, UserSummary};
pub use store::{SqliteUserStore, StoreError, UserStore};
pub use telegram::{TelegramClient, UpdatePoller, TELEGRAM_API_BASE};
pub use verify::{Challenge, EmojiCatalog, VerificationEngine};
