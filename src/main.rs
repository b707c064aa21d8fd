use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emoji_gate::{
    BotHandler, Config, EmojiCatalog, SqliteUserStore, TelegramClient, UpdatePoller,
    VerificationEngine, TELEGRAM_API_BASE,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting emoji-gate bot");

    if config.admin_ids.is_empty() {
        tracing::warn!("No admin ids configured; /list will be denied for everyone");
    }

    // Initialize components
    let store = SqliteUserStore::new(&config.database_url)?;
    let client = TelegramClient::new(TELEGRAM_API_BASE, &config.bot_token);
    let engine = VerificationEngine::new(store, EmojiCatalog::default(), config.admin_ids.clone());
    let handler = BotHandler::new(engine, client.clone(), config.bot_link.clone());

    UpdatePoller::new(client, handler, config.poll_timeout_secs)
        .run()
        .await;

    Ok(())
}
