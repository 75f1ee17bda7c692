// src/exec/supervisor.rs

//! Runs one task end to end.
//!
//! The supervisor asks its handler for work, spawns the configured binary
//! with the payload on stdin and in the environment, and then races:
//!
//! - the child exiting on its own,
//! - the wall-clock deadline,
//! - a SIGINT / SIGTERM delivered to the shim,
//! - a spot-interruption notice from the metadata endpoint,
//!
//! while forwarding heartbeats. The first terminal cause wins, even over a
//! heartbeat call still in progress. Exactly one of `success` / `failure` is
//! reported to the handler per received task, and no heartbeat is sent after
//! it.
//!
//! Both output streams are scanned until the child is gone, so stdout and
//! stderr may each carry a marked line. They never compete: a success
//! reports the stdout response, a failure reads its error from the stderr
//! response, and the other stream's line is only logged.

use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::{InterruptionConfig, TaskDefinition};
use crate::errors::ShimError;
use crate::exec::heartbeat::{HeartbeatEmitter, next_tick};
use crate::exec::relay::{deliver_input, spawn_output_relay};
use crate::exec::shutdown::shutdown;
use crate::handler::MessageHandler;
use crate::interrupt::{
    HttpMetadataClient, InterruptionWatcher, MetadataClient, SignalListener, fired,
};
use crate::types::{
    CancelReason, DEFAULT_ERROR_LABEL, PAYLOAD_ENV, StreamKind, TASK_ID_ENV, TaskResult,
};

/// How long output relays may keep running after the child is gone.
/// Grandchildren can hold a pipe open past the child's exit.
pub const OUTPUT_DRAIN: Duration = Duration::from_secs(2);

/// Owns a task definition and runs it against a [`MessageHandler`].
pub struct Supervisor {
    task: TaskDefinition,
    interruption: InterruptionConfig,
    metadata_client: Option<Arc<dyn MetadataClient>>,
    handle_signals: bool,
}

/// Why the race ended.
enum Outcome {
    Exited(ExitStatus),
    Cancelled(CancelReason),
    WaitFailed(std::io::Error),
}

/// What the supervisor hands to the handler once the child is done.
struct Completion {
    result: TaskResult,
    response: Option<String>,
}

impl Supervisor {
    pub fn new(task: TaskDefinition) -> Self {
        Self {
            task,
            interruption: InterruptionConfig::default(),
            metadata_client: None,
            handle_signals: true,
        }
    }

    pub fn with_interruption(mut self, interruption: InterruptionConfig) -> Self {
        self.interruption = interruption;
        self
    }

    /// Replace the HTTP metadata client (used by tests and custom transports).
    pub fn with_metadata_client(mut self, client: Arc<dyn MetadataClient>) -> Self {
        self.metadata_client = Some(client);
        self
    }

    /// Whether SIGINT / SIGTERM sent to this process cancel the task.
    /// Enabled by default.
    pub fn handle_signals(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    pub fn task(&self) -> &TaskDefinition {
        &self.task
    }

    /// Fetch one task from `handler`, run it, and report the outcome.
    ///
    /// Returns `None` when the handler had no work; nothing is spawned and no
    /// callback besides `initialize` / `receive` is made in that case.
    pub async fn execute(&self, handler: &mut dyn MessageHandler) -> Option<TaskResult> {
        handler.initialize().await;

        if !handler.receive().await {
            info!("no task available; nothing to do");
            return None;
        }

        let task_id = handler.identifier().to_string();
        let payload = handler.payload().to_string();

        let completion = self.run(&task_id, payload, handler).await;
        let result = completion.result.clone();

        if result.is_success() {
            info!(task = %task_id, "task succeeded");
            handler.success(completion.response).await;
        } else {
            warn!(
                task = %task_id,
                error = result.error.as_deref().unwrap_or_default(),
                exit = result.exit.as_deref().unwrap_or("-"),
                "task failed"
            );
            handler.failure(completion.result).await;
        }

        Some(result)
    }

    async fn run(
        &self,
        task_id: &str,
        payload: String,
        handler: &mut dyn MessageHandler,
    ) -> Completion {
        info!(
            task = %task_id,
            binary = %self.task.binary,
            args = ?self.task.args,
            timeout = ?self.task.timeout,
            "starting task process"
        );

        let mut cmd = Command::new(&self.task.binary);
        cmd.args(&self.task.args)
            .env(PAYLOAD_ENV, &payload)
            .env(TASK_ID_ENV, task_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = ShimError::Start {
                    binary: self.task.binary.clone(),
                    source,
                };
                error!(task = %task_id, error = %err, "could not start task process");
                return Completion {
                    result: TaskResult::failure(err.to_string(), None),
                    response: None,
                };
            }
        };

        // The budget starts when the child does.
        let deadline = tokio::time::sleep(self.task.timeout);
        tokio::pin!(deadline);

        let input = deliver_input(child.stdin.take(), payload, task_id.to_string());
        let stdout = spawn_output_relay(child.stdout.take(), StreamKind::Stdout, task_id.to_string());
        let stderr = spawn_output_relay(child.stderr.take(), StreamKind::Stderr, task_id.to_string());

        let mut heartbeat = HeartbeatEmitter::start(self.task.heartbeat);
        let (tracker, mut instance_rx) = self.start_tracking().unzip();
        let (listener, mut signal_rx) = self.listen_for_signals().unzip();

        // A heartbeat in flight never holds back a terminal cause.
        let outcome = 'race: loop {
            tokio::select! {
                biased;

                outcome = next_outcome(&mut child, deadline.as_mut(), &mut signal_rx, &mut instance_rx) => {
                    break outcome;
                }
                _ = next_tick(&mut heartbeat) => {
                    debug!(task = %task_id, "sending heartbeat");
                    let beat = handler.heartbeat();
                    tokio::select! {
                        biased;

                        outcome = next_outcome(&mut child, deadline.as_mut(), &mut signal_rx, &mut instance_rx) => {
                            debug!(task = %task_id, "heartbeat abandoned");
                            break 'race outcome;
                        }
                        _ = beat => {}
                    }
                }
            }
        };

        // Nothing below may produce a heartbeat.
        if let Some(heartbeat) = heartbeat.take() {
            heartbeat.stop();
        }
        if let Some(tracker) = tracker {
            tracker.stop();
        }
        drop(listener);

        match &outcome {
            Outcome::Exited(status) => {
                info!(task = %task_id, %status, "task process exited");
            }
            Outcome::Cancelled(reason) => {
                warn!(task = %task_id, error = %ShimError::Cancelled(*reason), "stopping task process");
                shutdown(&mut child, task_id).await;
            }
            Outcome::WaitFailed(e) => {
                error!(task = %task_id, error = %e, "waiting for task process failed");
                shutdown(&mut child, task_id).await;
            }
        }

        settle(input, task_id).await;
        let stdout_response = collect(stdout, StreamKind::Stdout, task_id).await;
        let stderr_response = collect(stderr, StreamKind::Stderr, task_id).await;

        self.complete(outcome, stdout_response, stderr_response.as_deref())
    }

    fn complete(
        &self,
        outcome: Outcome,
        stdout_response: Option<String>,
        stderr_response: Option<&str>,
    ) -> Completion {
        let binary = &self.task.binary;

        let result = match outcome {
            Outcome::Exited(status) if status.success() => {
                return Completion {
                    result: TaskResult::success(),
                    response: stdout_response,
                };
            }
            Outcome::Exited(status) => {
                let exit = exit_label(&status);
                if let Some(code) = status.code() {
                    let err = ShimError::RuntimeExit {
                        binary: binary.clone(),
                        code,
                    };
                    debug!(error = %err, "non-zero exit");
                }
                TaskResult::failure(error_label(stderr_response), Some(exit))
            }
            Outcome::Cancelled(CancelReason::Timeout) => {
                let err = ShimError::Timeout {
                    binary: binary.clone(),
                    timeout: self.task.timeout,
                };
                TaskResult::failure(err.to_string(), Some(CancelReason::Timeout.label().to_string()))
            }
            Outcome::Cancelled(reason) => {
                TaskResult::failure(reason.label(), Some(reason.label().to_string()))
            }
            Outcome::WaitFailed(e) => {
                TaskResult::failure(format!("waiting for '{binary}' failed: {e}"), None)
            }
        };

        Completion {
            result,
            response: None,
        }
    }

    /// Start the interruption watcher if the task asks for it.
    fn start_tracking(&self) -> Option<(Tracker, oneshot::Receiver<()>)> {
        if !self.task.track_interruption {
            return None;
        }

        let client: Arc<dyn MetadataClient> = match &self.metadata_client {
            Some(client) => Arc::clone(client),
            None => match HttpMetadataClient::new(self.interruption.request_timeout) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    warn!(error = %e, "interruption tracking unavailable");
                    return None;
                }
            },
        };

        let watcher = Arc::new(InterruptionWatcher::from_config(&self.interruption, client));
        let (tx, rx) = oneshot::channel();
        let handle = {
            let watcher = Arc::clone(&watcher);
            tokio::spawn(async move { watcher.track(tx).await })
        };

        Some((Tracker { watcher, handle }, rx))
    }

    fn listen_for_signals(&self) -> Option<(SignalListener, oneshot::Receiver<()>)> {
        if !self.handle_signals {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        match SignalListener::spawn(tx) {
            Ok(listener) => Some((listener, rx)),
            Err(e) => {
                warn!(error = %e, "could not install signal handlers");
                None
            }
        }
    }
}

/// First terminal cause among the child exiting, the deadline and the two
/// cancellation events.
async fn next_outcome(
    child: &mut Child,
    deadline: Pin<&mut Sleep>,
    signal_rx: &mut Option<oneshot::Receiver<()>>,
    instance_rx: &mut Option<oneshot::Receiver<()>>,
) -> Outcome {
    tokio::select! {
        biased;

        status = child.wait() => match status {
            Ok(status) => Outcome::Exited(status),
            Err(e) => Outcome::WaitFailed(e),
        },
        _ = deadline => Outcome::Cancelled(CancelReason::Timeout),
        _ = fired(signal_rx) => Outcome::Cancelled(CancelReason::SignalInterruption),
        _ = fired(instance_rx) => Outcome::Cancelled(CancelReason::ExternalInterruption),
    }
}

/// Running watcher plus its polling task.
struct Tracker {
    watcher: Arc<InterruptionWatcher>,
    handle: JoinHandle<()>,
}

impl Tracker {
    fn stop(self) {
        self.watcher.untrack();
        self.handle.abort();
    }
}

async fn settle(mut input: JoinHandle<()>, task_id: &str) {
    if timeout(OUTPUT_DRAIN, &mut input).await.is_err() {
        debug!(task = %task_id, "payload delivery still pending; abandoning it");
        input.abort();
    }
}

async fn collect(
    mut relay: JoinHandle<Option<String>>,
    stream: StreamKind,
    task_id: &str,
) -> Option<String> {
    match timeout(OUTPUT_DRAIN, &mut relay).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(task = %task_id, %stream, error = %e, "output relay failed");
            None
        }
        Err(_) => {
            warn!(task = %task_id, %stream, "output still open after exit; dropping the rest");
            relay.abort();
            None
        }
    }
}

/// Exit code as text, or the terminating signal when there is no code.
fn exit_label(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return code.to_string();
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("signal {signal}");
        }
    }

    "unknown".to_string()
}

/// Error label from a stderr response of the form `{"error": ...}`.
///
/// Anything unusable falls back to [`DEFAULT_ERROR_LABEL`].
pub fn error_label(response: Option<&str>) -> String {
    use serde_json::Value;

    response
        .and_then(|r| serde_json::from_str::<Value>(r).ok())
        .and_then(|v| match v.get("error")? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| DEFAULT_ERROR_LABEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_label_reads_the_error_field() {
        assert_eq!(error_label(Some(r#"{"error":"disk full"}"#)), "disk full");
        assert_eq!(error_label(Some(r#"{"error":42}"#)), "42");
        assert_eq!(error_label(Some(r#"{"error":{"kind":"io"}}"#)), r#"{"kind":"io"}"#);
    }

    #[test]
    fn error_label_falls_back() {
        assert_eq!(error_label(None), DEFAULT_ERROR_LABEL);
        assert_eq!(error_label(Some("plain text")), DEFAULT_ERROR_LABEL);
        assert_eq!(error_label(Some(r#"{"error":null}"#)), DEFAULT_ERROR_LABEL);
        assert_eq!(error_label(Some(r#"{"error":""}"#)), DEFAULT_ERROR_LABEL);
        assert_eq!(error_label(Some(r#"{"message":"x"}"#)), DEFAULT_ERROR_LABEL);
        assert_eq!(error_label(Some(r#"["error"]"#)), DEFAULT_ERROR_LABEL);
    }

    #[cfg(unix)]
    #[test]
    fn exit_label_prefers_code_then_signal() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_label(&ExitStatus::from_raw(3 << 8)), "3");
        assert_eq!(exit_label(&ExitStatus::from_raw(9)), "signal 9");
    }
}
