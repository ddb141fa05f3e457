use serde::Deserialize;
use serde_json::Value;
use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup, ReplyMarkup};
use tracing::{debug, info};

use crate::config::TelegramConfig;
use crate::gateway::{GatewayError, MessagingGateway, SendMessage};

pub const START_COMMAND: &str = "/start";
const BOT_COMMAND_ENTITY: &str = "bot_command";

const CONTACT_PROMPT_TEXT: &str = "📱 Пожалуйста, отправьте ваш номер телефона:";
const CONTACT_BUTTON_TEXT: &str = "📤 Отправить номер";

/// The slice of a Bot API `Update` this service looks at. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct InboundUpdate {
    #[serde(default)]
    pub update_id: Option<Value>,
    #[serde(default)]
    pub message: Option<InboundMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub text: Option<String>,
    /// Only each entity's `type` is read; the rest of the entity is not validated.
    #[serde(default)]
    pub entities: Option<Vec<Value>>,
}

fn is_command_entity(entity: &Value) -> bool {
    entity.get("type").and_then(Value::as_str) == Some(BOT_COMMAND_ENTITY)
}

impl InboundUpdate {
    /// Parse a raw webhook body. Anything that isn't a JSON update is an empty update.
    pub fn from_body(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_else(|e| {
            debug!("Ignoring unparseable update: {}", e);
            Self::default()
        })
    }

    /// Exactly `/start`, sent with at least one `bot_command` entity.
    pub fn is_start_command(&self) -> bool {
        let Some(message) = &self.message else {
            return false;
        };
        let has_command_entity = message
            .entities
            .as_ref()
            .is_some_and(|entities| entities.iter().any(is_command_entity));
        has_command_entity && message.text.as_deref() == Some(START_COMMAND)
    }
}

fn contact_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new([[KeyboardButton::new(CONTACT_BUTTON_TEXT).request(ButtonRequest::Contact)]])
        .resize_keyboard()
        .one_time_keyboard()
}

pub fn contact_prompt(telegram: &TelegramConfig) -> SendMessage {
    SendMessage {
        chat_id: telegram.chat_id.clone(),
        text: CONTACT_PROMPT_TEXT.to_string(),
        reply_markup: Some(ReplyMarkup::Keyboard(contact_keyboard())),
    }
}

/// React to a pushed update. Returns whether a prompt was sent.
pub async fn handle_update(
    gateway: &dyn MessagingGateway,
    telegram: &TelegramConfig,
    update: &InboundUpdate,
) -> Result<bool, GatewayError> {
    if !update.is_start_command() {
        return Ok(false);
    }

    gateway.send_message(&contact_prompt(telegram)).await?;
    info!(
        "Sent contact prompt for /start (update {:?})",
        update.update_id
    );
    Ok(true)
}
