#![allow(dead_code)]

use std::time::Duration;

use taskshim::config::TaskDefinition;

/// Builder for `TaskDefinition` to simplify test setup.
///
/// Defaults differ from production: heartbeats are off and the timeout is
/// short, so a forgotten setting fails fast instead of hanging a test.
pub struct TaskDefinitionBuilder {
    task: TaskDefinition,
}

impl TaskDefinitionBuilder {
    pub fn new(binary: &str) -> Self {
        let mut task = TaskDefinition::new(binary);
        task.timeout = Duration::from_secs(10);
        task.heartbeat = Duration::ZERO;
        Self { task }
    }

    /// `sh -c <script>`; the usual way tests describe a child.
    pub fn shell(script: &str) -> Self {
        Self::new("sh").args(&["-c", script])
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.task.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.task.timeout = timeout;
        self
    }

    pub fn heartbeat(mut self, interval: Duration) -> Self {
        self.task.heartbeat = interval;
        self
    }

    pub fn track_interruption(mut self, val: bool) -> Self {
        self.task.track_interruption = val;
        self
    }

    pub fn build(self) -> TaskDefinition {
        self.task
    }
}
