//! Shutdown coordination for the service.

use std::fmt;

use tokio::sync::broadcast;

/// What asked the service to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGTERM.
    Terminate,
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// Programmatic request through [`Shutdown::trigger`].
    Requested,
    /// The HTTP server stopped on its own.
    ServerStopped,
    /// Startup aborted before the service was listening.
    StartupFailed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShutdownReason::Terminate => "SIGTERM",
            ShutdownReason::Interrupt => "SIGINT",
            ShutdownReason::Requested => "shutdown request",
            ShutdownReason::ServerStopped => "server stop",
            ShutdownReason::StartupFailed => "startup failure",
        })
    }
}

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// Cloning yields another trigger for the same channel.
#[derive(Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<ShutdownReason>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self, reason: ShutdownReason) {
        let _ = self.tx.send(reason);
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for the next shutdown request on `rx`.
///
/// A lagged or closed channel still means "stop".
pub async fn recv_reason(rx: &mut broadcast::Receiver<ShutdownReason>) -> ShutdownReason {
    match rx.recv().await {
        Ok(reason) => reason,
        Err(broadcast::error::RecvError::Lagged(_)) | Err(broadcast::error::RecvError::Closed) => {
            ShutdownReason::Requested
        }
    }
}
