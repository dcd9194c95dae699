//! Process-wide gateway connection. One background task owns the live
//! session; every platform operation is marshaled onto it through a command
//! queue. Nothing else in the process ever touches the session handle.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};

use crate::error::{DeliveryError, SessionError};
use crate::types::Notification;

// ─── Transport seam ─────────────────────────────────────────────────────────

/// Platform operations executed by the session-owning task.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    /// Establish the session; returns the authenticated identity.
    async fn login(&self) -> Result<String, SessionError>;

    /// Send a notification to a channel.
    async fn send_notification(
        &self,
        channel_id: u64,
        notification: &Notification,
    ) -> Result<(), SessionError>;
}

// ─── Connection lifecycle ───────────────────────────────────────────────────

/// Lifecycle of the gateway session. Transitions are forward-only:
/// Uninitialized -> Connecting -> Ready | Failed. Failed is terminal; the
/// assumed recovery path is a supervisor restarting the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Uninitialized,
    Connecting,
    Ready,
    Failed,
}

/// A request for the session-owning task, carrying a one-shot reply slot.
pub enum SessionCommand {
    Send {
        channel_id: u64,
        notification: Notification,
        reply: oneshot::Sender<Result<(), DeliveryError>>,
    },
}

/// Owns the single live session to the chat platform for the process's
/// lifetime. The transport handle is moved into the background task on first
/// start; state is published through a watch channel so any number of tasks
/// can wait on readiness concurrently.
pub struct GatewayConnection {
    started: AtomicBool,
    transport: Mutex<Option<Box<dyn ChatTransport>>>,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    cmd_rx: Mutex<Option<mpsc::UnboundedReceiver<SessionCommand>>>,
    state_tx: watch::Sender<GatewayState>,
    state_rx: watch::Receiver<GatewayState>,
}

impl GatewayConnection {
    pub fn new(transport: Box<dyn ChatTransport>) -> Arc<Self> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(GatewayState::Uninitialized);
        Arc::new(Self {
            started: AtomicBool::new(false),
            transport: Mutex::new(Some(transport)),
            cmd_tx,
            cmd_rx: Mutex::new(Some(cmd_rx)),
            state_tx,
            state_rx,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GatewayState {
        *self.state_rx.borrow()
    }

    /// Spawn the session-owning task. Idempotent and non-blocking: exactly
    /// one task is spawned no matter how many callers race here.
    pub fn ensure_started(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let transport = self
            .transport
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let cmd_rx = self
            .cmd_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let (Some(transport), Some(cmd_rx)) = (transport, cmd_rx) else {
            return;
        };

        self.publish(GatewayState::Connecting);
        let conn = Arc::clone(self);
        tokio::spawn(async move { conn.run_session(transport, cmd_rx).await });
    }

    /// Wait until the session reaches `Ready` or `Failed`, or the timeout
    /// elapses; returns the last observed state. Safe for any number of
    /// concurrent waiters.
    pub async fn await_ready(&self, timeout: Duration) -> GatewayState {
        let mut rx = self.state_rx.clone();
        let _ = tokio::time::timeout(
            timeout,
            rx.wait_for(|s| matches!(s, GatewayState::Ready | GatewayState::Failed)),
        )
        .await;
        let state = *rx.borrow();
        state
    }

    /// Enqueue a command for the session-owning task. The queue is unbounded;
    /// backpressure is the caller's bounded wait on the reply.
    pub fn submit(&self, cmd: SessionCommand) -> Result<(), DeliveryError> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| DeliveryError::Gateway("session task is gone".to_string()))
    }

    /// Publish a state transition. Ready and Failed are published at most
    /// once; a second attempt is a no-op, not an error.
    fn publish(&self, next: GatewayState) {
        self.state_tx.send_if_modified(|state| {
            if matches!(*state, GatewayState::Ready | GatewayState::Failed) || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    async fn run_session(
        self: Arc<Self>,
        transport: Box<dyn ChatTransport>,
        mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    ) {
        match transport.login().await {
            Ok(identity) => {
                info!(identity, "gateway session established");
                self.publish(GatewayState::Ready);
            }
            Err(e) => {
                error!(error = %e, "gateway session failed to start");
                self.publish(GatewayState::Failed);
                // Pending and future commands resolve immediately as gateway
                // errors; callers never hang on a dead session.
                while let Some(SessionCommand::Send { reply, .. }) = cmd_rx.recv().await {
                    let _ = reply.send(Err(DeliveryError::Gateway(format!(
                        "session failed to start: {e}"
                    ))));
                }
                return;
            }
        }

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                SessionCommand::Send {
                    channel_id,
                    notification,
                    reply,
                } => {
                    debug!(channel_id, "executing send on session task");
                    let result = match transport.send_notification(channel_id, &notification).await
                    {
                        Ok(()) => Ok(()),
                        Err(SessionError::ChannelNotFound(id)) => {
                            Err(DeliveryError::ChannelNotFound(id))
                        }
                        Err(e) => Err(DeliveryError::Gateway(e.to_string())),
                    };
                    // The caller may have timed out and dropped the receiver.
                    let _ = reply.send(result);
                }
            }
        }
    }
}

// ─── Test doubles ───────────────────────────────────────────────────────────
