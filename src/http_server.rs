use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bridge::DeliveryBridge;
use crate::format;
use crate::types::{EventKind, WebhookEvent, WebhookPayload};
use crate::verification;

/// Shared state for the webhook endpoints.
#[derive(Clone)]
pub struct AppState {
    pub webhook_secret: Option<String>,
    pub notification_channel: u64,
    pub bridge: Arc<DeliveryBridge>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/github-webhook", post(handle_webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve until the listener fails. The caller owns binding so tests can run
/// on an ephemeral port.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// One pass per inbound event: verify, parse, format, deliver, respond.
/// Only signature and parse failures surface over HTTP; delivery failures
/// are logged and swallowed, because the sender only cares that the event
/// was accepted.
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let signature = header_str(&headers, "x-hub-signature-256");
    if !verification::verify_signature(state.webhook_secret.as_deref(), &body, signature) {
        warn!("webhook signature verification failed");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid signature"})),
        );
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "rejecting malformed webhook payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "malformed payload"})),
            );
        }
    };

    // GitHub always sets the event header; treat an absent one as a push.
    let kind = match headers.get("x-github-event").and_then(|v| v.to_str().ok()) {
        Some(value) => EventKind::from_header(value),
        None => EventKind::Push,
    };

    let event = WebhookEvent { kind, payload };
    let notification = format::render(&event);

    let delivery_id = Uuid::new_v4();
    match state
        .bridge
        .deliver(state.notification_channel, notification)
        .await
    {
        Ok(()) => info!(%delivery_id, kind = ?event.kind, "notification delivered"),
        Err(e) => warn!(%delivery_id, kind = ?event.kind, error = %e, "notification delivery failed"),
    }

    (StatusCode::OK, Json(json!({"status": "success"})))
}

/// Liveness only; never waits on gateway readiness.
async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
