//! HTTP surface for the order front end and the Bot API webhook.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::ApiError;
use crate::gateway::MessagingGateway;
use crate::orders::{self, CompletionRequest, MarkDoneBody, Order, SendOrderBody};
use crate::webhook::{self, InboundUpdate};

const LIVENESS_TEXT: &str = "🚀 Telegram bot backend is running!";

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<dyn MessagingGateway>,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn MessagingGateway>) -> Self {
        Self {
            config: Arc::new(config),
            gateway,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemsQuery {
    order_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/send-order", post(send_order))
        .route("/mark-done", post(mark_done))
        .route("/webhook", post(webhook_update))
        .route("/items", get(items))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Server running at http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down...");
        })
        .await
        .context("Server error")?;

    Ok(())
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

async fn send_order(
    State(state): State<AppState>,
    body: Result<Json<SendOrderBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let order = Order::try_from(body)?;

    let sent = orders::notify_new_order(state.gateway.as_ref(), &state.config.telegram, order).await?;

    Ok(Json(json!({ "success": true, "message_id": sent.message_id })))
}

async fn mark_done(
    State(state): State<AppState>,
    body: Result<Json<MarkDoneBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let request = CompletionRequest::try_from(body)?;

    orders::mark_done(state.gateway.as_ref(), &request).await?;

    Ok(Json(json!({ "success": true, "message": "Order marked as done" })))
}

/// The platform only needs a quick 200; failures are logged, never returned.
async fn webhook_update(State(state): State<AppState>, body: Bytes) -> StatusCode {
    debug!("Received Telegram update: {}", String::from_utf8_lossy(&body));

    let update = InboundUpdate::from_body(&body);
    if let Err(e) =
        webhook::handle_update(state.gateway.as_ref(), &state.config.telegram, &update).await
    {
        error!("Failed to answer update: {}", e);
    }

    StatusCode::OK
}

async fn items(
    query: Result<Query<ItemsQuery>, QueryRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let order_id = query
        .ok()
        .and_then(|Query(q)| q.order_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("provide order_id"))?;

    Ok(Json(orders::lookup_items(&order_id)))
}
