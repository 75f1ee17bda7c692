// src/exec/shutdown.rs

//! Graceful-then-forceful termination of a child process.

use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long a child gets to exit after the interrupt before it is killed.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Stop `child`: send an interrupt where the platform has one, wait up to
/// [`SHUTDOWN_GRACE`] for it to exit, then kill it. The child is reaped
/// before this returns. Attempted once; errors are logged.
pub async fn shutdown(child: &mut Child, task_id: &str) {
    if let Ok(Some(status)) = child.try_wait() {
        debug!(task = %task_id, %status, "child already exited before shutdown");
        return;
    }

    if send_interrupt(child, task_id) {
        match timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                info!(task = %task_id, %status, "child exited after interrupt");
                return;
            }
            Ok(Err(e)) => {
                warn!(task = %task_id, error = %e, "waiting for interrupted child failed");
            }
            Err(_) => {
                info!(task = %task_id, grace = ?SHUTDOWN_GRACE, "child ignored interrupt");
            }
        }
    }

    info!(task = %task_id, "killing child process");
    if let Err(e) = child.kill().await {
        warn!(task = %task_id, error = %e, "failed to kill child process");
    }
}

#[cfg(unix)]
fn send_interrupt(child: &Child, task_id: &str) -> bool {
    let Some(pid) = child.id() else {
        return false;
    };
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };

    // SAFETY: `kill` has no memory-safety preconditions; `pid` belongs to a
    // child we have not reaped yet, so it cannot have been recycled.
    let rc = unsafe { libc::kill(pid, libc::SIGINT) };
    if rc != 0 {
        warn!(
            task = %task_id,
            error = %std::io::Error::last_os_error(),
            "failed to send interrupt to child"
        );
        return false;
    }
    debug!(task = %task_id, pid, "interrupt signal sent");
    true
}

// No interrupt signal to send; go straight to kill.
#[cfg(not(unix))]
fn send_interrupt(_child: &Child, _task_id: &str) -> bool {
    false
}
