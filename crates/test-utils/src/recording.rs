use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskshim::handler::{HandlerFuture, MessageHandler};
use taskshim::types::TaskResult;

/// One observed handler callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerCall {
    Initialize,
    Receive,
    Heartbeat,
    Success(Option<String>),
    Failure(TaskResult),
}

/// Handler that records every callback in order.
///
/// Clones share the same log, so a test can keep one and hand the other to
/// the supervisor.
#[derive(Clone)]
pub struct RecordingHandler {
    id: String,
    payload: String,
    available: bool,
    heartbeat_delay: Duration,
    calls: Arc<Mutex<Vec<HandlerCall>>>,
}

impl RecordingHandler {
    pub fn new(id: &str, payload: &str) -> Self {
        Self {
            id: id.to_string(),
            payload: payload.to_string(),
            available: true,
            heartbeat_delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A handler whose `receive` reports no work.
    pub fn empty() -> Self {
        Self {
            available: false,
            ..Self::new("", "")
        }
    }

    /// Make every `heartbeat` take `delay` to complete, like a slow
    /// transport. The call is recorded when it starts.
    pub fn with_heartbeat_delay(mut self, delay: Duration) -> Self {
        self.heartbeat_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn heartbeats(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, HandlerCall::Heartbeat))
            .count()
    }

    /// Callbacks after the terminal `success` / `failure`, if any.
    pub fn calls_after_terminal(&self) -> Vec<HandlerCall> {
        let calls = self.calls();
        match calls
            .iter()
            .position(|c| matches!(c, HandlerCall::Success(_) | HandlerCall::Failure(_)))
        {
            Some(idx) => calls[idx + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    fn record(&self, call: HandlerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MessageHandler for RecordingHandler {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn payload(&self) -> &str {
        &self.payload
    }

    fn initialize(&mut self) -> HandlerFuture<'_, ()> {
        Box::pin(async move { self.record(HandlerCall::Initialize) })
    }

    fn receive(&mut self) -> HandlerFuture<'_, bool> {
        Box::pin(async move {
            self.record(HandlerCall::Receive);
            self.available
        })
    }

    fn success(&mut self, response: Option<String>) -> HandlerFuture<'_, ()> {
        Box::pin(async move { self.record(HandlerCall::Success(response)) })
    }

    fn failure(&mut self, result: TaskResult) -> HandlerFuture<'_, ()> {
        Box::pin(async move { self.record(HandlerCall::Failure(result)) })
    }

    fn heartbeat(&mut self) -> HandlerFuture<'_, ()> {
        Box::pin(async move {
            self.record(HandlerCall::Heartbeat);
            if !self.heartbeat_delay.is_zero() {
                tokio::time::sleep(self.heartbeat_delay).await;
            }
        })
    }
}
