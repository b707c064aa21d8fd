//! Maps inbound Telegram updates to verification-engine events and engine
//! outcomes back to outbound API calls. All user-visible strings live here.

use crate::models::UserSummary;
use crate::store::{StoreError, UserStore};
use crate::telegram::types::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode, TgUser, Update,
};
use crate::telegram::{TelegramClient, TelegramError};
use crate::verify::{
    Challenge, EngineError, ListOutcome, ResponseOutcome, StartOutcome, VerificationEngine,
    PAYLOAD_PREFIX,
};

const CAPTCHA_KEYBOARD_WIDTH: usize = 3;

/// Sent to the triggering user when storage fails mid-event, so the error
/// is never a silent drop.
const FAILURE_NOTICE: &str = "⚠️ Something went wrong. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] TelegramError),
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
}

pub struct BotHandler<S> {
    engine: VerificationEngine<S>,
    client: TelegramClient,
    /// Deep link offered when someone starts the bot from a group chat.
    bot_link: Option<String>,
}

impl<S: UserStore> BotHandler<S> {
    pub fn new(
        engine: VerificationEngine<S>,
        client: TelegramClient,
        bot_link: Option<String>,
    ) -> Self {
        Self {
            engine,
            client,
            bot_link,
        }
    }

    pub async fn handle_update(&self, update: Update) -> Result<(), HandlerError> {
        if let Some(message) = update.message {
            self.handle_message(message).await
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await
        } else {
            Ok(())
        }
    }

    async fn handle_message(&self, message: Message) -> Result<(), HandlerError> {
        let Some(from) = message.from.clone() else {
            return Ok(());
        };

        let text = message.text.as_deref().unwrap_or("");
        match command_of(text) {
            "/start" => self.handle_start(&message, &from).await,
            "/list" => self.handle_list(&message, &from).await,
            _ => self.handle_fallback(&message).await,
        }
    }

    async fn handle_start(&self, message: &Message, from: &TgUser) -> Result<(), HandlerError> {
        let username = from.username.as_deref().unwrap_or("unknown");
        let outcome = match self.engine.start(from.id, username, message.chat.is_private()) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.notify_failure(message.chat.id).await;
                return Err(e.into());
            }
        };

        match outcome {
            StartOutcome::RedirectToPrivate => {
                let keyboard = self
                    .bot_link
                    .as_deref()
                    .map(|link| InlineKeyboardMarkup::single(InlineKeyboardButton::url("Go to bot", link)));
                self.client
                    .send_message_with(
                        message.chat.id,
                        "❗ Please message me in private.",
                        None,
                        keyboard,
                    )
                    .await?;
            }
            StartOutcome::AlreadyBlocked => {
                self.client
                    .send_message(
                        message.chat.id,
                        "🚫 You are blocked due to too many failed attempts.",
                    )
                    .await?;
            }
            StartOutcome::AlreadyRegistered => {
                self.client
                    .send_message(message.chat.id, "✅ You are already registered.")
                    .await?;
            }
            StartOutcome::Challenge(challenge) => {
                self.send_captcha(message.chat.id, &challenge).await?;
            }
        }
        Ok(())
    }

    async fn handle_callback(&self, callback: CallbackQuery) -> Result<(), HandlerError> {
        let Some(data) = callback.data.as_deref() else {
            return Ok(());
        };
        if !data.starts_with(PAYLOAD_PREFIX) {
            return Ok(());
        }

        let chat_id = callback.message.as_ref().map(|m| m.chat.id);

        match self.engine.challenge_response(data) {
            Ok(ResponseOutcome::Verified { .. }) => {
                self.client
                    .answer_callback_query(&callback.id, "✅ Verification successful!")
                    .await?;
                if let Some(chat_id) = chat_id {
                    self.client
                        .send_message(chat_id, "🎉 You have been registered.")
                        .await?;
                }
            }
            Ok(ResponseOutcome::AlreadyBlocked) => {
                self.client
                    .answer_callback_query(&callback.id, "🚫 You are blocked.")
                    .await?;
            }
            Ok(ResponseOutcome::NowBlocked) => {
                self.client
                    .answer_callback_query(
                        &callback.id,
                        "🚫 Too many failed attempts. You are blocked.",
                    )
                    .await?;
                if let Some(chat_id) = chat_id {
                    self.client
                        .send_message(chat_id, "🚫 You have been blocked.")
                        .await?;
                }
            }
            Ok(ResponseOutcome::Retry(challenge)) => {
                self.client
                    .answer_callback_query(&callback.id, "❌ Incorrect. Try again.")
                    .await?;
                if let Some(chat_id) = chat_id {
                    self.send_captcha(chat_id, &challenge).await?;
                }
            }
            Err(EngineError::Payload(e)) => {
                tracing::warn!(user_id = callback.from.id, "malformed captcha payload: {}", e);
                self.client
                    .answer_callback_query(&callback.id, "⚠️ This verification button is invalid.")
                    .await?;
            }
            Err(EngineError::Store(e)) => {
                if let Err(send_err) = self
                    .client
                    .answer_callback_query(&callback.id, FAILURE_NOTICE)
                    .await
                {
                    tracing::error!("Failed to answer callback query: {}", send_err);
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn handle_list(&self, message: &Message, from: &TgUser) -> Result<(), HandlerError> {
        let outcome = match self.engine.list(from.id) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.notify_failure(message.chat.id).await;
                return Err(e.into());
            }
        };

        match outcome {
            ListOutcome::Unauthorized => {
                self.client
                    .send_message(message.chat.id, "❌ You are not authorized.")
                    .await?;
            }
            ListOutcome::Users(rows) if rows.is_empty() => {
                self.client
                    .send_message(message.chat.id, "ℹ️ No users found.")
                    .await?;
            }
            ListOutcome::Users(rows) => {
                self.client
                    .send_message_with(
                        message.chat.id,
                        &format_user_list(&rows),
                        Some(ParseMode::Html),
                        None,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn handle_fallback(&self, message: &Message) -> Result<(), HandlerError> {
        if message.chat.is_private() {
            self.client
                .send_message(
                    message.chat.id,
                    "Use /start to register or /list if you're an admin.",
                )
                .await?;
        }
        Ok(())
    }

    /// Best-effort failure notice; the original error is what propagates.
    async fn notify_failure(&self, chat_id: i64) {
        if let Err(e) = self.client.send_message(chat_id, FAILURE_NOTICE).await {
            tracing::error!("Failed to send failure notice: {}", e);
        }
    }

    async fn send_captcha(&self, chat_id: i64, challenge: &Challenge) -> Result<(), TelegramError> {
        let buttons = challenge
            .choices
            .iter()
            .map(|choice| InlineKeyboardButton::callback(&choice.symbol, &choice.callback_data))
            .collect();
        let keyboard = InlineKeyboardMarkup::rows_of(buttons, CAPTCHA_KEYBOARD_WIDTH);

        let text = format!(
            "🔒 Verification required!\nPlease click on the emoji for *{}*",
            challenge.target_label
        );
        self.client
            .send_message_with(chat_id, &text, Some(ParseMode::Markdown), Some(keyboard))
            .await
    }
}

/// First token of the message with any `@botname` mention stripped:
/// commands arrive as `/start@botname` when sent in group chats.
fn command_of(text: &str) -> &str {
    let token = text.split_whitespace().next().unwrap_or("");
    token.split('@').next().unwrap_or(token)
}

fn format_user_list(rows: &[UserSummary]) -> String {
    let mut text = String::from("<b>Registered Users:</b>\n\n");
    for row in rows {
        let status = if row.blocked { "🔴 Blocked" } else { "🟢 Active" };
        text.push_str(&format!(
            "🆔 <code>{}</code>\n👤 @{}\n📅 {}\n{}\n\n",
            row.id, row.username, row.registered_at, status
        ));
    }
    text
}
