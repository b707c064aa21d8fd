use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::types::{InlineKeyboardMarkup, ParseMode, Update};

/// Production Bot API endpoint. Tests inject a mock server instead.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http_client: Client,
    base_url: String,
}

/// Envelope every Bot API method responds with. The `Option` fields stay
/// plain: `#[serde(default)]` on a generic field would force a `T: Default`
/// bound onto the derived `Deserialize` impl, and missing fields already
/// decode to `None`.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
    text: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Telegram API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TelegramClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
        }
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call("getUpdates", &GetUpdatesRequest { offset, timeout })
            .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.send_message_with(chat_id, text, None, None).await
    }

    pub async fn send_message_with(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessageRequest {
                    chat_id,
                    text,
                    parse_mode,
                    reply_markup: reply_markup.as_ref(),
                },
            )
            .await?;
        Ok(())
    }

    /// Show a short notification in response to a pressed inline button.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: &str,
    ) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryRequest {
                    callback_query_id,
                    text,
                },
            )
            .await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/{}", self.base_url, method);

        tracing::debug!("Calling Telegram API: {}", method);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TelegramError::ApiError(format!("{}: {}", status, body)));
        }

        let api_response: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::InvalidResponse(e.to_string()))?;

        if !api_response.ok {
            return Err(TelegramError::ApiError(
                api_response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        api_response
            .result
            .ok_or_else(|| TelegramError::InvalidResponse("missing result field".to_string()))
    }
}
