use thiserror::Error;

/// Outcome of a bridged delivery attempt, reported back to the caller's
/// task. Delivery failures are logged and swallowed at the webhook boundary;
/// none of these ever fail the HTTP response.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("channel {0} not found")]
    ChannelNotFound(u64),
    #[error("gateway connection is not ready")]
    NotReady,
    #[error("delivery timed out before the gateway responded")]
    Timeout,
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Errors surfaced by the chat platform transport.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("gateway rejected the session credentials")]
    AuthRejected,
    #[error("channel {0} not found")]
    ChannelNotFound(u64),
    #[error("platform API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}
