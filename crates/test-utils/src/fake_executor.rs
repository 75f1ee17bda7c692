use std::sync::{Arc, Mutex};

use taskshim::exec::{ExecuteFuture, Executable};
use taskshim::handler::MessageHandler;
use taskshim::types::TaskResult;

/// A fake executor that:
/// - drives the handler through `initialize` / `receive` like the supervisor
/// - records which task ids were "run"
/// - reports a canned result instead of spawning anything.
pub struct FakeExecutor {
    result: TaskResult,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new(result: TaskResult, executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self { result, executed }
    }
}

impl Executable for FakeExecutor {
    fn execute<'a>(&'a self, handler: &'a mut dyn MessageHandler) -> ExecuteFuture<'a> {
        Box::pin(async move {
            handler.initialize().await;
            if !handler.receive().await {
                return None;
            }

            {
                let mut guard = self.executed.lock().unwrap();
                guard.push(handler.identifier().to_string());
            }

            if self.result.is_success() {
                handler.success(None).await;
            } else {
                handler.failure(self.result.clone()).await;
            }
            Some(self.result.clone())
        })
    }
}
