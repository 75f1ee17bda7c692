// src/exec/heartbeat.rs

//! Fixed-interval heartbeat ticker.
//!
//! The ticker runs in its own Tokio task and only *signals* ticks over a
//! channel; the supervisor owns the handler and performs the actual
//! `heartbeat()` call. Once [`HeartbeatEmitter::stop`] returns, no further
//! tick can be observed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub struct HeartbeatEmitter {
    ticks: mpsc::Receiver<()>,
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl HeartbeatEmitter {
    /// Start ticking every `interval`, first tick one interval from now.
    ///
    /// Returns `None` for a zero interval: heartbeats are disabled and no
    /// task is spawned.
    pub fn start(interval: Duration) -> Option<Self> {
        if interval.is_zero() {
            debug!("heartbeat disabled");
            return None;
        }

        // A single slot: a slow heartbeat call coalesces pending ticks.
        let (tx, ticks) = mpsc::channel(1);
        let stop = CancellationToken::new();
        let token = stop.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        trace!("heartbeat tick");
                        if tx.try_send(()).is_err() && tx.is_closed() {
                            break;
                        }
                    }
                }
            }
            debug!("heartbeat ticker stopped");
        });

        debug!(?interval, "heartbeat started");
        Some(Self {
            ticks,
            stop,
            handle,
        })
    }

    /// Wait for the next tick. Pending forever once the ticker is gone.
    pub async fn tick(&mut self) {
        if self.ticks.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Stop the ticker and discard any tick not yet observed.
    pub fn stop(mut self) {
        self.stop.cancel();
        self.ticks.close();
        self.handle.abort();
    }
}

/// Next tick of an optional emitter; pending forever when disabled.
pub async fn next_tick(emitter: &mut Option<HeartbeatEmitter>) {
    match emitter {
        Some(emitter) => emitter.tick().await,
        None => std::future::pending::<()>().await,
    }
}
