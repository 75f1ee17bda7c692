#![allow(dead_code)]

use taskshim::config::TaskDefinition;
use taskshim::exec::Supervisor;

pub use taskshim_test_utils::{
    HandlerCall, RecordingHandler, ScriptedMetadataClient, TaskDefinitionBuilder, init_tracing,
    with_timeout,
};

/// Supervisor for tests: signal handling stays off so parallel tests in one
/// binary don't install process-wide handlers.
pub fn supervisor(task: TaskDefinition) -> Supervisor {
    Supervisor::new(task).handle_signals(false)
}

/// Whether a process with this pid still exists.
#[cfg(unix)]
pub fn pid_alive(pid: i32) -> bool {
    // SAFETY: signal 0 only checks for existence and permissions.
    unsafe { libc::kill(pid, 0) == 0 }
}

/// Read a pid the child wrote with `echo $$ > file`.
pub fn read_pid(path: &std::path::Path) -> i32 {
    std::fs::read_to_string(path)
        .expect("child should have written its pid")
        .trim()
        .parse()
        .expect("pid file should contain a number")
}
