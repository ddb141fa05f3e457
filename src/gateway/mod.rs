pub mod telegram;

#[cfg(test)]
pub mod recording;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use teloxide::types::{InlineKeyboardMarkup, Recipient, ReplyMarkup};
use thiserror::Error;

pub use telegram::TelegramGateway;

/// Bot API method names used by this service
pub const SEND_MESSAGE: &str = "sendMessage";
pub const EDIT_MESSAGE_TEXT: &str = "editMessageText";
pub const EDIT_MESSAGE_REPLY_MARKUP: &str = "editMessageReplyMarkup";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{method} request failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} returned {status}: {body}")]
    Api {
        method: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{method} returned an unexpected response: {reason}")]
    MalformedResponse { method: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: Recipient,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// Replaces a message's text. Leaving `reply_markup` out removes any inline keyboard.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageText {
    pub chat_id: Recipient,
    pub message_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageReplyMarkup {
    pub chat_id: Recipient,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

/// The part of a sent `Message` this service reads back.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SentMessage {
    pub message_id: i64,
    #[serde(default)]
    pub chat: Option<SentChat>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SentChat {
    pub id: i64,
}

/// Outbound side of the messaging platform. One network call per method, no retries.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_message(&self, request: &SendMessage) -> Result<SentMessage, GatewayError>;

    async fn edit_message_text(&self, request: &EditMessageText) -> Result<(), GatewayError>;

    async fn edit_message_reply_markup(
        &self,
        request: &EditMessageReplyMarkup,
    ) -> Result<(), GatewayError>;
}
