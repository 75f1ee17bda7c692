// src/interrupt/watcher.rs

//! Spot-instance interruption watcher.
//!
//! Polls the instance metadata endpoint and fires a one-shot event as soon as
//! the provider announces a `stop` or `terminate` action. Every other answer,
//! including a failed poll, means "not this tick": the watcher must never take
//! the host run down because the metadata service hiccupped.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::InterruptionConfig;
use crate::errors::{Result, ShimError};

/// Default metadata endpoint announcing spot interruptions.
pub const METADATA_URL: &str = "http://169.254.169.254/latest/meta-data/spot/instance-action";

const ACTION_STOP: &str = "stop";
const ACTION_TERMINATE: &str = "terminate";

/// Body of a 200 response from the metadata endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InstanceAction {
    pub action: String,
    #[serde(default)]
    pub time: String,
}

/// Raw HTTP answer: status code plus body text.
#[derive(Debug, Clone)]
pub struct MetadataResponse {
    pub status: u16,
    pub body: String,
}

/// Transport used to query the metadata endpoint.
pub trait MetadataClient: Send + Sync {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<MetadataResponse>> + Send + 'a>>;
}

/// Production client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpMetadataClient {
    client: reqwest::Client,
}

impl HttpMetadataClient {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ShimError::ConfigError(format!("building metadata client: {e}")))?;
        Ok(Self { client })
    }
}

impl MetadataClient for HttpMetadataClient {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<MetadataResponse>> + Send + 'a>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(MetadataResponse { status, body })
        })
    }
}

/// Polls for interruption notices until one arrives or it is untracked.
///
/// One watcher serves one execution: once untracked it stays stopped.
pub struct InterruptionWatcher {
    url: String,
    interval: Duration,
    client: Arc<dyn MetadataClient>,
    stop: CancellationToken,
}

impl InterruptionWatcher {
    pub fn new(url: impl Into<String>, interval: Duration, client: Arc<dyn MetadataClient>) -> Self {
        Self {
            url: url.into(),
            interval,
            client,
            stop: CancellationToken::new(),
        }
    }

    pub fn from_config(cfg: &InterruptionConfig, client: Arc<dyn MetadataClient>) -> Self {
        Self::new(cfg.url.clone(), cfg.poll_interval, client)
    }

    /// Poll every interval; on the first interruption notice, stop polling
    /// and send on `events` exactly once.
    ///
    /// Returns when an event was sent or the watcher was untracked.
    pub async fn track(&self, events: oneshot::Sender<()>) {
        info!(url = %self.url, interval = ?self.interval, "starting instance interruption tracking");

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.stop.cancelled() => {
                    debug!("interruption tracking stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if self.is_interrupting().await {
                        self.untrack();
                        if events.send(()).is_err() {
                            debug!("interruption event receiver already gone");
                        }
                        return;
                    }
                }
            }
        }
    }

    /// Stop polling. Idempotent; fine to call before or after `track`.
    pub fn untrack(&self) {
        self.stop.cancel();
    }

    pub fn is_tracking(&self) -> bool {
        !self.stop.is_cancelled()
    }

    /// One poll. Transient failures count as "no interruption".
    pub async fn is_interrupting(&self) -> bool {
        match self.instance_action().await {
            Ok(Some(action)) => {
                let hit = action.action == ACTION_STOP || action.action == ACTION_TERMINATE;
                if hit {
                    warn!(action = %action.action, time = %action.time, "instance interruption announced");
                } else {
                    debug!(action = %action.action, "instance action is not an interruption");
                }
                hit
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "interruption poll failed");
                false
            }
        }
    }

    /// `Ok(None)` when the endpoint answers 404 (nothing pending).
    async fn instance_action(&self) -> Result<Option<InstanceAction>> {
        let response = self.client.get(&self.url).await?;

        match response.status {
            404 => Ok(None),
            200 => {
                debug!(body = %response.body, "interruption endpoint response");
                serde_json::from_str::<InstanceAction>(&response.body)
                    .map(Some)
                    .map_err(|e| {
                        ShimError::WatcherTransient(format!(
                            "unparsable instance action '{}': {e}",
                            response.body
                        ))
                    })
            }
            other => Err(ShimError::WatcherTransient(format!(
                "metadata service returned {other} code"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u16, &'static str);

    impl MetadataClient for Fixed {
        fn get<'a>(
            &'a self,
            _url: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<MetadataResponse>> + Send + 'a>> {
            Box::pin(async move {
                Ok(MetadataResponse {
                    status: self.0,
                    body: self.1.to_string(),
                })
            })
        }
    }

    fn watcher(status: u16, body: &'static str) -> InterruptionWatcher {
        InterruptionWatcher::new("http://metadata.test", Duration::from_millis(1), Arc::new(Fixed(status, body)))
    }

    #[tokio::test]
    async fn stop_and_terminate_are_interruptions() {
        assert!(watcher(200, r#"{"action":"stop","time":"10:10"}"#).is_interrupting().await);
        assert!(watcher(200, r#"{"action":"terminate","time":"10:10"}"#).is_interrupting().await);
    }

    #[tokio::test]
    async fn other_answers_are_not() {
        assert!(!watcher(200, r#"{"action":"terminat","time":"10:10"}"#).is_interrupting().await);
        assert!(!watcher(200, "not json").is_interrupting().await);
        assert!(!watcher(404, "Not found").is_interrupting().await);
        assert!(!watcher(500, "boom").is_interrupting().await);
    }

    #[tokio::test]
    async fn not_found_is_not_an_error() {
        let w = watcher(404, "Not found");
        assert!(matches!(w.instance_action().await, Ok(None)));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let w = watcher(503, "");
        assert!(matches!(w.instance_action().await, Err(ShimError::WatcherTransient(_))));
    }

    #[test]
    fn untrack_is_idempotent() {
        let w = watcher(404, "");
        assert!(w.is_tracking());
        w.untrack();
        w.untrack();
        assert!(!w.is_tracking());
    }
}
