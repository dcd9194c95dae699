//! Bounded-wait dispatch from HTTP handler tasks onto the gateway's
//! session-owning task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};

use crate::error::DeliveryError;
use crate::gateway::{GatewayConnection, GatewayState, SessionCommand};
use crate::types::Notification;

/// Overall budget for one delivery attempt, readiness wait included.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Accepts delivery requests from any task and resolves them to a definite
/// outcome within a fixed budget.
///
/// A timed-out send is not cancelled on the session task: the caller gets
/// `Timeout` while the platform call may still complete late. Deliveries are
/// therefore at-most-once but possibly late, and never retried.
pub struct DeliveryBridge {
    gateway: Arc<GatewayConnection>,
}

impl DeliveryBridge {
    pub fn new(gateway: Arc<GatewayConnection>) -> Self {
        Self { gateway }
    }

    /// Deliver a notification under the default budget.
    pub async fn deliver(
        &self,
        channel_id: u64,
        notification: Notification,
    ) -> Result<(), DeliveryError> {
        self.deliver_within(channel_id, notification, DELIVERY_TIMEOUT)
            .await
    }

    /// Deliver under an explicit budget. The readiness wait and the send
    /// share one deadline.
    pub async fn deliver_within(
        &self,
        channel_id: u64,
        notification: Notification,
        budget: Duration,
    ) -> Result<(), DeliveryError> {
        let deadline = Instant::now() + budget;
        self.gateway.ensure_started();

        match self.gateway.await_ready(remaining(deadline)).await {
            GatewayState::Ready => {}
            GatewayState::Failed => {
                return Err(DeliveryError::Gateway(
                    "gateway connection failed".to_string(),
                ))
            }
            _ => return Err(DeliveryError::NotReady),
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.gateway.submit(SessionCommand::Send {
            channel_id,
            notification,
            reply: reply_tx,
        })?;

        match timeout_at(deadline, reply_rx).await {
            Err(_) => Err(DeliveryError::Timeout),
            Ok(Err(_)) => Err(DeliveryError::Gateway(
                "session task dropped the request".to_string(),
            )),
            Ok(Ok(result)) => result,
        }
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
