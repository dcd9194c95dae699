mod bridge;
mod config;
mod discord;
mod error;
mod format;
mod gateway;
mod http_server;
mod types;
mod verification;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::bridge::DeliveryBridge;
use crate::config::Config;
use crate::discord::DiscordRest;
use crate::gateway::{GatewayConnection, GatewayState};
use crate::http_server::AppState;

/// How long startup waits for the gateway session before serving anyway.
const STARTUP_READY_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = Config::from_env().context("loading configuration")?;
    if config.webhook_secret.is_none() {
        warn!("GITHUB_WEBHOOK_SECRET is not set; webhook signature verification is disabled");
    }

    let transport = DiscordRest::new(config.bot_token.clone());
    let gateway = GatewayConnection::new(Box::new(transport));

    // Warm up the session so it is usually ready before the first webhook.
    gateway.ensure_started();
    match gateway.await_ready(STARTUP_READY_TIMEOUT).await {
        GatewayState::Ready => info!("gateway session ready"),
        GatewayState::Failed => {
            // Not fatal: keep serving /health and let deliveries surface
            // gateway errors until a supervisor restarts the process.
            error!("gateway session failed to start; deliveries will fail until restart");
        }
        _ => warn!("gateway session not ready yet; early deliveries may report NotReady"),
    }

    let state = AppState {
        webhook_secret: config.webhook_secret.clone(),
        notification_channel: config.notification_channel,
        bridge: Arc::new(DeliveryBridge::new(gateway)),
    };

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "webhook HTTP server listening");

    http_server::serve(listener, state)
        .await
        .context("HTTP server")?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
