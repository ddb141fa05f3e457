use reqwest::Url;
use serde::Deserialize;
use serde_json::{Number, Value};
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, Recipient, ReplyMarkup, WebAppInfo,
};
use tracing::{debug, info};

use crate::config::{parse_recipient, TelegramConfig};
use crate::error::ApiError;
use crate::gateway::{
    EditMessageReplyMarkup, EditMessageText, GatewayError, MessagingGateway, SendMessage,
};

const COLLECT_BUTTON_TEXT: &str = "Собрать заказ";
const MISSING_ORDER_ID: &str = "N/A";

/// Stand-in catalogue until orders come from a real data source
pub const SAMPLE_ITEMS: [&str; 4] = ["Маргарита", "Кола", "Картошка фри", "Донер"];

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: String,
    /// Kept as sent by the front end so the deep link carries them back unchanged
    pub items: Vec<Value>,
}

/// An order notification that is live in a chat and can still be edited.
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub chat_id: Recipient,
    pub message_id: i64,
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub chat_id: Recipient,
    pub message_id: i64,
    pub order_id: Option<String>,
}

// ── Request bodies (loose — shapes are checked by hand so errors stay uniform) ──

#[derive(Debug, Default, Deserialize)]
pub struct SendOrderBody {
    #[serde(default)]
    pub order_id: Option<Value>,
    #[serde(default)]
    pub items: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkDoneBody {
    #[serde(default)]
    pub chat_id: Option<Value>,
    #[serde(default)]
    pub message_id: Option<Value>,
    #[serde(default)]
    pub order_id: Option<Value>,
}

/// Whole-number floats print as integers (`42.0` → `42`).
fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

/// Non-empty strings and non-zero numbers, as a string. Everything else counts as absent.
fn identifier(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(number_text(&n)),
        _ => None,
    }
}

/// How an item reads in the chat message: strings bare, everything else as JSON.
pub fn item_label(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

impl TryFrom<SendOrderBody> for Order {
    type Error = ApiError;

    fn try_from(body: SendOrderBody) -> Result<Self, Self::Error> {
        let invalid = || ApiError::validation("order_id and items (array) are required");

        let order_id = identifier(body.order_id).ok_or_else(invalid)?;
        let items = match body.items {
            Some(Value::Array(values)) => values,
            _ => return Err(invalid()),
        };

        Ok(Order { order_id, items })
    }
}

impl TryFrom<MarkDoneBody> for CompletionRequest {
    type Error = ApiError;

    fn try_from(body: MarkDoneBody) -> Result<Self, Self::Error> {
        let invalid = || ApiError::validation("chat_id and message_id are required");

        let chat_id = identifier(body.chat_id)
            .and_then(|raw| parse_recipient(&raw))
            .ok_or_else(invalid)?;
        let message_id = identifier(body.message_id)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .ok_or_else(invalid)?;

        Ok(CompletionRequest {
            chat_id,
            message_id,
            order_id: identifier(body.order_id),
        })
    }
}

/// `1. first\n2. second`
pub fn format_item_list(items: &[Value]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item_label(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn order_summary(order: &Order) -> String {
    format!(
        "🍕 Новый заказ #{}:\n\n{}",
        order.order_id,
        format_item_list(&order.items)
    )
}

pub fn completion_text(order_id: Option<&str>) -> String {
    format!(
        "✅ Заказ #{} собран. Спасибо!",
        order_id.unwrap_or(MISSING_ORDER_ID)
    )
}

/// Chat id as it appears in the mini app query string
pub fn recipient_param(chat: &Recipient) -> String {
    match chat {
        Recipient::Id(id) => id.0.to_string(),
        Recipient::ChannelUsername(name) => name.clone(),
    }
}

/// Deep link that tells the mini app which order and message it is acting on.
pub fn mini_app_url(base: &Url, notification: &SentNotification) -> Url {
    let items = Value::Array(notification.order.items.clone()).to_string();
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("order_id", &notification.order.order_id)
        .append_pair("message_id", &notification.message_id.to_string())
        .append_pair("chat_id", &recipient_param(&notification.chat_id))
        .append_pair("items", &items);
    url
}

fn collect_keyboard(url: Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::web_app(
        COLLECT_BUTTON_TEXT,
        WebAppInfo { url },
    )]])
}

/// Post the order to the staff chat, then point its button at the order-specific mini app link.
///
/// The edit depends on the message id returned by the send. If the edit fails the
/// message stays in the chat with a button that opens the bare mini app.
pub async fn notify_new_order(
    gateway: &dyn MessagingGateway,
    telegram: &TelegramConfig,
    order: Order,
) -> Result<SentNotification, GatewayError> {
    let sent = gateway
        .send_message(&SendMessage {
            chat_id: telegram.chat_id.clone(),
            text: order_summary(&order),
            reply_markup: Some(ReplyMarkup::InlineKeyboard(collect_keyboard(
                telegram.web_app_url.clone(),
            ))),
        })
        .await?;

    debug!(
        "Order #{} posted as message {} (chat {:?})",
        order.order_id,
        sent.message_id,
        sent.chat.as_ref().map(|c| c.id)
    );

    let notification = SentNotification {
        chat_id: telegram.chat_id.clone(),
        message_id: sent.message_id,
        order,
    };

    let url = mini_app_url(&telegram.web_app_url, &notification);
    gateway
        .edit_message_reply_markup(&EditMessageReplyMarkup {
            chat_id: notification.chat_id.clone(),
            message_id: notification.message_id,
            reply_markup: Some(collect_keyboard(url)),
        })
        .await?;

    info!(
        "Order #{} sent to staff chat as message {}",
        notification.order.order_id, notification.message_id
    );
    Ok(notification)
}

/// Swap the notification text for the "collected" confirmation; no markup means no button.
pub async fn mark_done(
    gateway: &dyn MessagingGateway,
    request: &CompletionRequest,
) -> Result<(), GatewayError> {
    gateway
        .edit_message_text(&EditMessageText {
            chat_id: request.chat_id.clone(),
            message_id: request.message_id,
            text: completion_text(request.order_id.as_deref()),
            reply_markup: None,
        })
        .await?;

    info!(
        "Order #{} marked as done (message {})",
        request.order_id.as_deref().unwrap_or(MISSING_ORDER_ID),
        request.message_id
    );
    Ok(())
}

/// Items for an order. Every order currently gets the sample catalogue.
pub fn lookup_items(order_id: &str) -> Vec<String> {
    debug!("Looking up items for order #{}", order_id);
    SAMPLE_ITEMS.iter().map(|s| s.to_string()).collect()
}
