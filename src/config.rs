use std::env;
use std::net::SocketAddr;

use crate::error::ConfigError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token for the outbound gateway session.
    pub bot_token: String,
    /// Shared secret for webhook signature verification. `None` disables
    /// verification.
    pub webhook_secret: Option<String>,
    /// Target channel for repository notifications.
    pub notification_channel: u64,
    /// Listen address for the webhook HTTP server.
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = require("DISCORD_TOKEN")?;

        let channel_raw = require("GITHUB_NOTIFICATION_CHANNEL")?;
        let notification_channel = channel_raw.parse().map_err(|e| ConfigError::InvalidVar {
            name: "GITHUB_NOTIFICATION_CHANNEL",
            reason: format!("expected a numeric channel id: {e}"),
        })?;

        let webhook_secret = env::var("GITHUB_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let bind_addr = env::var("RELAY_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidVar {
                name: "RELAY_BIND_ADDR",
                reason: format!("{e}"),
            })?;

        Ok(Self {
            bot_token,
            webhook_secret,
            notification_channel,
            bind_addr,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment mutation is process-global; serialize these tests.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for name in [
            "DISCORD_TOKEN",
            "GITHUB_NOTIFICATION_CHANNEL",
            "GITHUB_WEBHOOK_SECRET",
            "RELAY_BIND_ADDR",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn loads_full_configuration() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("DISCORD_TOKEN", "token-123");
        env::set_var("GITHUB_NOTIFICATION_CHANNEL", "42");
        env::set_var("GITHUB_WEBHOOK_SECRET", "s3cret");
        env::set_var("RELAY_BIND_ADDR", "127.0.0.1:9999");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bot_token, "token-123");
        assert_eq!(config.notification_channel, 42);
        assert_eq!(config.webhook_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.bind_addr.port(), 9999);
    }

    #[test]
    fn missing_token_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("GITHUB_NOTIFICATION_CHANNEL", "42");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingVar("DISCORD_TOKEN"))
        ));
    }

    #[test]
    fn non_numeric_channel_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("DISCORD_TOKEN", "token-123");
        env::set_var("GITHUB_NOTIFICATION_CHANNEL", "general");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidVar { name: "GITHUB_NOTIFICATION_CHANNEL", .. })
        ));
    }

    #[test]
    fn empty_secret_disables_verification() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("DISCORD_TOKEN", "token-123");
        env::set_var("GITHUB_NOTIFICATION_CHANNEL", "42");
        env::set_var("GITHUB_WEBHOOK_SECRET", "");

        let config = Config::from_env().unwrap();
        assert!(config.webhook_secret.is_none());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    }
}
