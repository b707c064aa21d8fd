//! Minimal Telegram Bot API layer.
//!
//! This module provides:
//! - Typed request/response DTOs for the handful of methods the bot uses
//! - A reqwest-based client (`getUpdates`, `sendMessage`, `answerCallbackQuery`)
//! - A long-polling update loop

mod client;
mod poller;
pub mod types;

pub use client::{TelegramClient, TelegramError, TELEGRAM_API_BASE};
pub use poller::UpdatePoller;
