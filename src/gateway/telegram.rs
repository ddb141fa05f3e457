use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    EditMessageReplyMarkup, EditMessageText, GatewayError, MessagingGateway, SendMessage,
    SentMessage, EDIT_MESSAGE_REPLY_MARKUP, EDIT_MESSAGE_TEXT, SEND_MESSAGE,
};
use crate::config::TelegramConfig;

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

pub struct TelegramGateway {
    client: reqwest::Client,
    method_base: String,
}

impl TelegramGateway {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            method_base: config.method_base(),
        }
    }

    async fn call<P, R>(&self, method: &'static str, payload: &P) -> Result<R, GatewayError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.method_base, method);

        debug!("Calling Bot API method {}", method);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                method,
                source: source.without_url(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Transport {
                method,
                source: source.without_url(),
            })?;

        if !status.is_success() {
            return Err(GatewayError::Api {
                method,
                status,
                body,
            });
        }

        let envelope: ApiResponse<R> =
            serde_json::from_str(&body).map_err(|e| GatewayError::MalformedResponse {
                method,
                reason: e.to_string(),
            })?;

        if !envelope.ok {
            return Err(GatewayError::Api {
                method,
                status,
                body: envelope.description.unwrap_or(body),
            });
        }

        envelope
            .result
            .ok_or_else(|| GatewayError::MalformedResponse {
                method,
                reason: "missing result".to_string(),
            })
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_message(&self, request: &SendMessage) -> Result<SentMessage, GatewayError> {
        self.call(SEND_MESSAGE, request).await
    }

    async fn edit_message_text(&self, request: &EditMessageText) -> Result<(), GatewayError> {
        // Result is the edited Message, or `true` for inline messages.
        let _: serde_json::Value = self.call(EDIT_MESSAGE_TEXT, request).await?;
        Ok(())
    }

    async fn edit_message_reply_markup(
        &self,
        request: &EditMessageReplyMarkup,
    ) -> Result<(), GatewayError> {
        let _: serde_json::Value = self.call(EDIT_MESSAGE_REPLY_MARKUP, request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{StatusCode, Url};
    use serde_json::json;
    use teloxide::types::{ChatId, Recipient};
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> TelegramGateway {
        let config = TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: Recipient::Id(ChatId(-100)),
            web_app_url: Url::parse("https://shop.example/app").unwrap(),
            api_url: Url::parse(&server.uri()).unwrap(),
            test_environment: true,
        };
        TelegramGateway::new(&config)
    }

    #[tokio::test]
    async fn test_send_message_parses_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/test/sendMessage"))
            .and(body_partial_json(json!({ "chat_id": -100, "text": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": { "message_id": 321, "chat": { "id": -100, "type": "group" }, "date": 0 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sent = gateway_for(&server)
            .send_message(&SendMessage {
                chat_id: Recipient::Id(ChatId(-100)),
                text: "hello".to_string(),
                reply_markup: None,
            })
            .await
            .unwrap();

        assert_eq!(sent.message_id, 321);
        assert_eq!(sent.chat.map(|c| c.id), Some(-100));
    }

    #[tokio::test]
    async fn test_edit_text_without_markup_omits_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/test/editMessageText"))
            .and(body_json(json!({ "chat_id": 5, "message_id": 9, "text": "done" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })))
            .expect(1)
            .mount(&server)
            .await;

        gateway_for(&server)
            .edit_message_text(&EditMessageText {
                chat_id: Recipient::Id(ChatId(5)),
                message_id: 9,
                text: "done".to_string(),
                reply_markup: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upstream_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/test/editMessageReplyMarkup"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: message to edit not found"
            })))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .edit_message_reply_markup(&EditMessageReplyMarkup {
                chat_id: Recipient::Id(ChatId(5)),
                message_id: 9,
                reply_markup: None,
            })
            .await
            .unwrap_err();

        match err {
            GatewayError::Api {
                method,
                status,
                body,
            } => {
                assert_eq!(method, EDIT_MESSAGE_REPLY_MARKUP);
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.contains("message to edit not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_ok_envelope_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "description": "Forbidden: bot was kicked"
            })))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .edit_message_text(&EditMessageText {
                chat_id: Recipient::Id(ChatId(5)),
                message_id: 1,
                text: "x".to_string(),
                reply_markup: None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bot was kicked"));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .send_message(&SendMessage {
                chat_id: Recipient::Id(ChatId(5)),
                text: "x".to_string(),
                reply_markup: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = TelegramConfig {
            bot_token: "999:secret".to_string(),
            chat_id: Recipient::Id(ChatId(1)),
            web_app_url: Url::parse("https://shop.example/app").unwrap(),
            api_url: Url::parse("http://127.0.0.1:1").unwrap(),
            test_environment: false,
        };
        let err = TelegramGateway::new(&config)
            .send_message(&SendMessage {
                chat_id: Recipient::Id(ChatId(1)),
                text: "x".to_string(),
                reply_markup: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport { .. }));
        assert!(!err.to_string().contains("999:secret"));
    }
}
