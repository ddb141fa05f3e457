//! In-process `MessagingGateway` that records calls instead of hitting the network.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{
    EditMessageReplyMarkup, EditMessageText, GatewayError, MessagingGateway, SendMessage,
    SentMessage, EDIT_MESSAGE_REPLY_MARKUP, EDIT_MESSAGE_TEXT, SEND_MESSAGE,
};

#[derive(Debug, Clone)]
pub enum GatewayCall {
    Send(SendMessage),
    EditText(EditMessageText),
    EditReplyMarkup(EditMessageReplyMarkup),
}

impl GatewayCall {
    pub fn method(&self) -> &'static str {
        match self {
            GatewayCall::Send(_) => SEND_MESSAGE,
            GatewayCall::EditText(_) => EDIT_MESSAGE_TEXT,
            GatewayCall::EditReplyMarkup(_) => EDIT_MESSAGE_REPLY_MARKUP,
        }
    }
}

pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    next_message_id: i64,
    fail_method: Option<&'static str>,
}

impl RecordingGateway {
    pub fn new(next_message_id: i64) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_message_id,
            fail_method: None,
        }
    }

    /// Answer the given method with an upstream 400. The call is still recorded.
    pub fn failing_on(mut self, method: &'static str) -> Self {
        self.fail_method = Some(method);
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.calls().iter().map(GatewayCall::method).collect()
    }

    fn record(&self, call: GatewayCall) -> Result<(), GatewayError> {
        let method = call.method();
        self.calls.lock().unwrap().push(call);
        if self.fail_method == Some(method) {
            return Err(GatewayError::Api {
                method,
                status: StatusCode::BAD_REQUEST,
                body: "Bad Request: chat not found".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_message(&self, request: &SendMessage) -> Result<SentMessage, GatewayError> {
        self.record(GatewayCall::Send(request.clone()))?;
        Ok(SentMessage {
            message_id: self.next_message_id,
            chat: None,
        })
    }

    async fn edit_message_text(&self, request: &EditMessageText) -> Result<(), GatewayError> {
        self.record(GatewayCall::EditText(request.clone()))
    }

    async fn edit_message_reply_markup(
        &self,
        request: &EditMessageReplyMarkup,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::EditReplyMarkup(request.clone()))
    }
}
