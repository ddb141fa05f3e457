use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::gateway::GatewayError;

/// Failure of an HTTP handler. Every variant renders as `{ success: false, error }`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input; no upstream call was made.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(msg) => warn!("Rejected request: {}", msg),
            ApiError::Gateway(e) => error!("Bot API call failed: {}", e),
        }
        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::validation("provide order_id").status(),
            StatusCode::BAD_REQUEST
        );
        let upstream = GatewayError::MalformedResponse {
            method: "sendMessage",
            reason: "missing result".to_string(),
        };
        assert_eq!(
            ApiError::from(upstream).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_gateway_message_surfaces_unchanged() {
        let err = ApiError::from(GatewayError::MalformedResponse {
            method: "editMessageText",
            reason: "missing result".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "editMessageText returned an unexpected response: missing result"
        );
    }
}
