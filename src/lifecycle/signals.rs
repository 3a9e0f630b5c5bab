//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals to shutdown requests
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Every signal is forwarded; the controller ignores all but the first

use std::io;

use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};

#[cfg(unix)]
struct Signals {
    term: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            term: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    async fn next(&mut self) -> ShutdownReason {
        tokio::select! {
            _ = self.term.recv() => ShutdownReason::Terminate,
            _ = self.interrupt.recv() => ShutdownReason::Interrupt,
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn install() -> io::Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> ShutdownReason {
        match tokio::signal::ctrl_c().await {
            Ok(()) => ShutdownReason::Interrupt,
            Err(_) => std::future::pending().await,
        }
    }
}

/// Install the handlers and forward every signal to `shutdown`.
///
/// Installation happens before this returns so no signal arriving during
/// startup is lost.
pub fn spawn_signal_listener(shutdown: Shutdown) -> io::Result<tokio::task::JoinHandle<()>> {
    let mut signals = Signals::install()?;

    Ok(tokio::spawn(async move {
        loop {
            let reason = signals.next().await;
            tracing::info!(signal = %reason, "{} received, shutting down gracefully", reason);
            shutdown.trigger(reason);
        }
    }))
}
