// src/handler/mod.rs

//! Message handlers: where a task comes from and where its outcome goes.
//!
//! The supervisor only ever talks to the [`MessageHandler`] capability
//! surface. Concrete variants differ in transport:
//!
//! - [`EnvHandler`]: static payload handed in through configuration.
//! - queue-backed and workflow-token-backed sources are recognised by
//!   [`TaskSource::detect`] but their transports are not part of this crate;
//!   [`build_handler`] reports them as unsupported.

use std::future::Future;
use std::pin::Pin;

use crate::errors::{Result, ShimError};
use crate::types::TaskResult;

pub mod env;

pub use env::EnvHandler;

/// Boxed future returned by handler callbacks.
pub type HandlerFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Capability set the supervisor needs from a task origin.
///
/// Callbacks are infallible from the supervisor's point of view: a handler
/// that cannot reach its transport logs the problem itself.
pub trait MessageHandler: Send {
    /// Opaque task identifier, valid after a successful `receive`.
    fn identifier(&self) -> &str;

    /// Task payload, valid after a successful `receive`.
    fn payload(&self) -> &str;

    fn initialize(&mut self) -> HandlerFuture<'_, ()>;

    /// Fetch the next task. `false` means there is no work.
    fn receive(&mut self) -> HandlerFuture<'_, bool>;

    fn success(&mut self, response: Option<String>) -> HandlerFuture<'_, ()>;

    fn failure(&mut self, result: TaskResult) -> HandlerFuture<'_, ()>;

    fn heartbeat(&mut self) -> HandlerFuture<'_, ()>;
}

/// Where the task payload is expected to come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSource {
    /// Workflow activity identified by a task token.
    WorkflowToken { token: String },
    /// Payload given directly.
    Static { payload: String },
    /// Polling a message queue.
    Queue { url: String },
    /// Polling a workflow activity for work.
    WorkflowActivity { arn: String },
}

/// Raw source settings as collected from the CLI / environment.
#[derive(Debug, Clone, Default)]
pub struct SourceSettings {
    pub task_token: Option<String>,
    pub payload: Option<String>,
    pub queue_url: Option<String>,
    pub activity_arn: Option<String>,
}

impl TaskSource {
    /// Pick a source. A task token wins over a static payload, which wins
    /// over queue and activity polling.
    pub fn detect(settings: &SourceSettings) -> Result<Self> {
        let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();

        if let Some(token) = non_empty(&settings.task_token) {
            return Ok(TaskSource::WorkflowToken { token });
        }
        if let Some(payload) = non_empty(&settings.payload) {
            return Ok(TaskSource::Static { payload });
        }
        if let Some(url) = non_empty(&settings.queue_url) {
            return Ok(TaskSource::Queue { url });
        }
        if let Some(arn) = non_empty(&settings.activity_arn) {
            return Ok(TaskSource::WorkflowActivity { arn });
        }
        Err(ShimError::ConfigError(
            "no task source configured (set TASK_PAYLOAD, TASK_TOKEN, TASK_QUEUE_URL or TASK_ACTIVITY_ARN)"
                .to_string(),
        ))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TaskSource::WorkflowToken { .. } => "workflow-token",
            TaskSource::Static { .. } => "static",
            TaskSource::Queue { .. } => "queue",
            TaskSource::WorkflowActivity { .. } => "workflow-activity",
        }
    }
}

/// Build the handler for a detected source.
pub fn build_handler(source: &TaskSource) -> Result<Box<dyn MessageHandler>> {
    match source {
        TaskSource::Static { payload } => Ok(Box::new(EnvHandler::new(payload.clone()))),
        other => Err(ShimError::UnsupportedSource(other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_takes_priority_over_payload() {
        let settings = SourceSettings {
            task_token: Some("tok".into()),
            payload: Some("{}".into()),
            ..Default::default()
        };
        assert_eq!(
            TaskSource::detect(&settings).unwrap(),
            TaskSource::WorkflowToken { token: "tok".into() }
        );
    }

    #[test]
    fn payload_takes_priority_over_queue() {
        let settings = SourceSettings {
            payload: Some("{}".into()),
            queue_url: Some("https://queue".into()),
            ..Default::default()
        };
        assert_eq!(
            TaskSource::detect(&settings).unwrap(),
            TaskSource::Static { payload: "{}".into() }
        );
    }

    #[test]
    fn empty_values_are_ignored() {
        let settings = SourceSettings {
            payload: Some(String::new()),
            activity_arn: Some("arn:activity".into()),
            ..Default::default()
        };
        assert_eq!(
            TaskSource::detect(&settings).unwrap().kind(),
            "workflow-activity"
        );
    }

    #[test]
    fn no_source_is_a_config_error() {
        let err = TaskSource::detect(&SourceSettings::default()).unwrap_err();
        assert!(matches!(err, ShimError::ConfigError(_)));
    }

    #[test]
    fn only_static_sources_build_a_handler() {
        assert!(build_handler(&TaskSource::Static { payload: "x".into() }).is_ok());
        let err = build_handler(&TaskSource::Queue { url: "u".into() })
            .err()
            .expect("queue source should be rejected");
        assert!(matches!(err, ShimError::UnsupportedSource("queue")));
    }
}
