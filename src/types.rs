// src/types.rs

//! Shared value types: the terminal [`TaskResult`], cancellation reasons and
//! the child I/O contract.
//!
//! # Child output protocol (v1)
//!
//! A child reports a machine-readable answer by printing a sentinel line
//! followed by exactly one content line:
//!
//! ```text
//! -=result=-
//! {"text":"hello"}
//! ```
//!
//! On the failure path the sentinel is `-=error=-` (on stderr) and the content
//! line should be a JSON object with an `"error"` key. The sentinel only marks
//! the *next* line; it is matched as a substring, so prefixes such as log
//! timestamps are tolerated. This is a narrow line-oriented contract, not a
//! general serialization format: multi-line content is not supported and the
//! last marked line on a stream wins.

use std::fmt;
use std::time::Duration;

/// Marks the next stdout line as the task response.
pub const RESULT_SENTINEL: &str = "-=result=-";

/// Marks the next output line as the structured error payload.
pub const ERROR_SENTINEL: &str = "-=error=-";

/// Environment variable carrying the payload into the child.
pub const PAYLOAD_ENV: &str = "TASK_PAYLOAD";

/// Environment variable carrying the task identifier into the child.
pub const TASK_ID_ENV: &str = "TASK_ID";

/// Error label used when a failing child gives no parsable reason.
pub const DEFAULT_ERROR_LABEL: &str = "ExecutionError";

/// Terminal outcome of one execution.
///
/// `error` is absent on success. `exit` holds the process exit code, or a
/// label naming the terminal cause when the process did not exit on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskResult {
    pub error: Option<String>,
    pub exit: Option<String>,
}

impl TaskResult {
    pub fn success() -> Self {
        Self {
            error: None,
            exit: Some("0".to_string()),
        }
    }

    pub fn failure(error: impl Into<String>, exit: Option<String>) -> Self {
        Self {
            error: Some(error.into()),
            exit,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable cause, suitable for a transport's "cause" field.
    pub fn message(&self) -> String {
        match (&self.error, &self.exit) {
            (None, _) => "completed successfully".to_string(),
            (Some(err), None) => err.clone(),
            (Some(err), Some(exit)) if err == exit => err.clone(),
            (Some(err), Some(exit)) if exit.parse::<i32>().is_ok() => {
                format!("exit code {exit}: {err}")
            }
            (Some(err), Some(exit)) => format!("{exit}: {err}"),
        }
    }

    /// Exit status for the shim process itself.
    ///
    /// Zero on success; the child's own code when it is a usable status;
    /// otherwise 1.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            return 0;
        }
        self.exit
            .as_deref()
            .and_then(|s| s.parse::<i32>().ok())
            .filter(|code| (1..=255).contains(code))
            .unwrap_or(1)
    }
}

/// Why a running task was stopped before it exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Wall-clock budget exceeded.
    Timeout,
    /// SIGINT / SIGTERM delivered to the shim.
    SignalInterruption,
    /// Cloud provider announced instance reclamation.
    ExternalInterruption,
}

impl CancelReason {
    pub fn label(self) -> &'static str {
        match self {
            CancelReason::Timeout => "Timeout",
            CancelReason::SignalInterruption => "SignalInterruption",
            CancelReason::ExternalInterruption => "ExternalInterruption",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which child output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
///
/// A bare `"0"` is accepted so that `--heartbeat 0` disables heartbeats.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}

/// Inverse of [`parse_duration`] for whole units; used in log and error text.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis % 1000 != 0 {
        return format!("{millis}ms");
    }
    let secs = d.as_secs();
    if secs != 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs != 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}
