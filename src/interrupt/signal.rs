// src/interrupt/signal.rs

//! One-shot notification for termination signals sent to the shim.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Background listener for SIGINT / SIGTERM (Ctrl-C elsewhere).
///
/// Dropping the listener stops it.
pub struct SignalListener {
    handle: JoinHandle<()>,
}

impl SignalListener {
    /// Start listening; `events` receives a single `()` on the first signal.
    pub fn spawn(events: oneshot::Sender<()>) -> std::io::Result<Self> {
        let handle = spawn_listener(events)?;
        Ok(Self { handle })
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(unix)]
fn spawn_listener(events: oneshot::Sender<()>) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    // Register before spawning so a registration failure is reported.
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("SIGINT received"),
            _ = terminate.recv() => info!("SIGTERM received"),
        }
        if events.send(()).is_err() {
            debug!("signal receiver already gone");
        }
    }))
}

#[cfg(not(unix))]
fn spawn_listener(events: oneshot::Sender<()>) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        info!("Ctrl+C received");
        if events.send(()).is_err() {
            debug!("signal receiver already gone");
        }
    }))
}
