use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token
    pub bot_token: String,
    /// User ids allowed to run /list
    pub admin_ids: Vec<i64>,
    /// SQLite database URL (default: sqlite:./data/users.db)
    pub database_url: String,
    /// Deep link to the bot, offered when /start arrives from a group chat
    pub bot_link: Option<String>,
    /// Log level (default: info)
    pub log_level: String,
    /// Long-polling timeout in seconds (default: 25)
    pub poll_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            bot_token: env::var("BOT_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("BOT_TOKEN"))?,
            admin_ids: parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default())?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/users.db".to_string()),
            bot_link: env::var("BOT_LINK").ok().filter(|link| !link.is_empty()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            poll_timeout_secs: env::var("POLL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPollTimeout)?,
        })
    }
}

fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse()
                .map_err(|_| ConfigError::InvalidAdminId(part.to_string()))
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid admin id: {0}")]
    InvalidAdminId(String),
    #[error("Invalid poll timeout")]
    InvalidPollTimeout,
}
