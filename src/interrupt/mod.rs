// src/interrupt/mod.rs

//! Asynchronous cancellation sources.
//!
//! - [`signal`]: SIGINT / SIGTERM delivered to the shim itself.
//! - [`watcher`]: cloud spot-interruption notices from the metadata endpoint.
//!
//! Both report through a `oneshot` channel; the supervisor folds them into
//! its outcome race together with the timeout.

use tokio::sync::oneshot;

pub mod signal;
pub mod watcher;

pub use signal::SignalListener;
pub use watcher::{
    HttpMetadataClient, InstanceAction, InterruptionWatcher, METADATA_URL, MetadataClient,
    MetadataResponse,
};

/// Wait on an optional one-shot event.
///
/// Resolves only when the sender actually fired. A dropped sender or a
/// missing receiver leaves it pending forever, which makes it usable as a
/// branch of a `select!` loop.
pub async fn fired(slot: &mut Option<oneshot::Receiver<()>>) {
    if let Some(rx) = slot.as_mut() {
        if rx.await.is_ok() {
            return;
        }
    }
    *slot = None;
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn resolves_when_sender_fires() {
        let (tx, rx) = oneshot::channel();
        let mut slot = Some(rx);
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), fired(&mut slot))
            .await
            .expect("event should be observed");
    }

    #[tokio::test]
    async fn dropped_sender_stays_pending() {
        let (tx, rx) = oneshot::channel::<()>();
        let mut slot = Some(rx);
        drop(tx);
        let res = tokio::time::timeout(Duration::from_millis(50), fired(&mut slot)).await;
        assert!(res.is_err());
        assert!(slot.is_none());
    }
}
