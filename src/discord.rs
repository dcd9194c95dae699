//! Discord REST transport. Authenticates with a bot token; notifications go
//! out as embeds on the channel message endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::SessionError;
use crate::gateway::ChatTransport;
use crate::types::Notification;

const API_BASE: &str = "https://discord.com/api/v10";

pub struct DiscordRest {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

#[derive(Deserialize)]
struct CurrentUser {
    id: String,
    username: String,
}

impl DiscordRest {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, API_BASE)
    }

    /// Point the client at a different API root (tests).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl ChatTransport for DiscordRest {
    async fn login(&self) -> Result<String, SessionError> {
        let resp = self
            .http
            .get(format!("{}/users/@me", self.base_url))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        match resp.status().as_u16() {
            200 => {
                let user: CurrentUser = resp.json().await?;
                debug!(user_id = %user.id, "authenticated against the gateway API");
                Ok(user.username)
            }
            401 | 403 => Err(SessionError::AuthRejected),
            status => Err(SessionError::Api {
                status,
                message: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn send_notification(
        &self,
        channel_id: u64,
        notification: &Notification,
    ) -> Result<(), SessionError> {
        let resp = self
            .http
            .post(format!(
                "{}/channels/{}/messages",
                self.base_url, channel_id
            ))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "embeds": [notification] }))
            .send()
            .await?;

        match resp.status().as_u16() {
            200..=299 => Ok(()),
            404 => Err(SessionError::ChannelNotFound(channel_id)),
            status => Err(SessionError::Api {
                status,
                message: resp.text().await.unwrap_or_default(),
            }),
        }
    }
}
