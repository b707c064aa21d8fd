use std::time::Duration;

use crate::handlers::BotHandler;
use crate::store::UserStore;

use super::client::TelegramClient;

/// Delay before retrying after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Long-polling update loop.
///
/// The offset advances past every received update, including ones whose
/// handling failed, so a poisonous update cannot wedge the loop.
pub struct UpdatePoller<S> {
    client: TelegramClient,
    handler: BotHandler<S>,
    poll_timeout_secs: u64,
}

impl<S: UserStore> UpdatePoller<S> {
    pub fn new(client: TelegramClient, handler: BotHandler<S>, poll_timeout_secs: u64) -> Self {
        Self {
            client,
            handler,
            poll_timeout_secs,
        }
    }

    pub async fn run(self) {
        tracing::info!("Bot is running");
        let mut offset = 0i64;

        loop {
            match self.client.get_updates(offset, self.poll_timeout_secs).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Err(e) = self.handler.handle_update(update).await {
                            tracing::error!("Update handling failed: {}", e);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Polling failed: {}", e);
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }
}
