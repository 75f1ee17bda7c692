// src/handler/env.rs

//! Static-payload handler.

use tracing::{debug, info, warn};

use super::{HandlerFuture, MessageHandler};
use crate::types::TaskResult;

/// Identifier reported for statically supplied tasks.
pub const LOCAL_TASK_ID: &str = "local";

/// Handler for a payload supplied up front (normally `TASK_PAYLOAD`).
///
/// There is no remote origin to acknowledge, so the terminal callbacks only
/// log. `receive` always yields work.
#[derive(Debug, Clone, Default)]
pub struct EnvHandler {
    configured_payload: String,
    message_id: String,
    message_body: String,
}

impl EnvHandler {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            configured_payload: payload.into(),
            message_id: String::new(),
            message_body: String::new(),
        }
    }
}

impl MessageHandler for EnvHandler {
    fn identifier(&self) -> &str {
        &self.message_id
    }

    fn payload(&self) -> &str {
        &self.message_body
    }

    fn initialize(&mut self) -> HandlerFuture<'_, ()> {
        Box::pin(async {})
    }

    fn receive(&mut self) -> HandlerFuture<'_, bool> {
        Box::pin(async move {
            self.message_id = LOCAL_TASK_ID.to_string();
            self.message_body = self.configured_payload.clone();
            debug!(task = %self.message_id, bytes = self.message_body.len(), "static payload received");
            true
        })
    }

    fn success(&mut self, response: Option<String>) -> HandlerFuture<'_, ()> {
        Box::pin(async move {
            info!(
                task = %self.message_id,
                response = response.as_deref().unwrap_or(""),
                "task succeeded"
            );
        })
    }

    fn failure(&mut self, result: TaskResult) -> HandlerFuture<'_, ()> {
        Box::pin(async move {
            warn!(task = %self.message_id, cause = %result.message(), "task failed");
        })
    }

    fn heartbeat(&mut self) -> HandlerFuture<'_, ()> {
        Box::pin(async move {
            debug!(task = %self.message_id, "heartbeat");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_exposes_local_id_and_payload() {
        let mut handler = EnvHandler::new(r#"{"name":"vasya"}"#);
        assert_eq!(handler.identifier(), "");

        handler.initialize().await;
        assert!(handler.receive().await);

        assert_eq!(handler.identifier(), LOCAL_TASK_ID);
        assert_eq!(handler.payload(), r#"{"name":"vasya"}"#);
    }

    #[tokio::test]
    async fn empty_payload_still_yields_work() {
        let mut handler = EnvHandler::new("");
        assert!(handler.receive().await);
        assert_eq!(handler.payload(), "");
    }
}
