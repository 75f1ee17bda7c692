// src/exec/relay.rs

//! Pipe relay between the shim and a child process.
//!
//! - [`deliver_input`] writes the payload to the child's stdin and closes it.
//! - [`spawn_output_relay`] drains one output stream line by line, logs every
//!   line, and returns the sentinel-marked response (see
//!   [`crate::types`] for the protocol).
//!
//! Nothing in here decides the task outcome; I/O problems are logged and end
//! the affected stream only.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::ChildStdin;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::{ERROR_SENTINEL, RESULT_SENTINEL, StreamKind};

/// Write `payload` to the child's stdin, then close it so the child sees EOF.
///
/// The returned handle resolves once delivery is over (successfully or not).
/// A child that exits without reading its input produces a broken pipe; that
/// is logged at debug level only.
pub fn deliver_input(
    stdin: Option<ChildStdin>,
    payload: String,
    task_id: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(mut stdin) = stdin else {
            debug!(task = %task_id, "no stdin pipe; skipping payload delivery");
            return;
        };

        if let Err(e) = stdin.write_all(payload.as_bytes()).await {
            debug!(task = %task_id, error = %e, "payload delivery interrupted");
        } else if let Err(e) = stdin.shutdown().await {
            debug!(task = %task_id, error = %e, "closing stdin failed");
        } else {
            debug!(task = %task_id, bytes = payload.len(), "payload delivered");
        }
        // Dropping the handle closes the pipe in every case.
        drop(stdin);
    })
}

/// Drain `reader` in a background task.
///
/// The handle resolves to the response line, if any, once the stream hits
/// EOF (normally when the child exits).
pub fn spawn_output_relay<R>(
    reader: Option<R>,
    stream: StreamKind,
    task_id: String,
) -> JoinHandle<Option<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match reader {
            Some(reader) => scan_lines(reader, stream, &task_id).await,
            None => {
                warn!(task = %task_id, %stream, "no pipe attached; output not captured");
                None
            }
        }
    })
}

/// Read `reader` to EOF, logging each line, and return the last line that
/// directly follows a sentinel line. An empty marked line counts as no
/// response.
pub async fn scan_lines<R>(reader: R, stream: StreamKind, task_id: &str) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');
    let mut response: Option<String> = None;
    let mut next_is_response = false;

    loop {
        let raw = match segments.next_segment().await {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(e) => {
                warn!(task = %task_id, %stream, error = %e, "output relay read failed; stopping");
                break;
            }
        };

        let text = String::from_utf8_lossy(&raw);
        let line = text.strip_suffix('\r').unwrap_or(text.as_ref());

        log_line(task_id, stream, line);

        if next_is_response {
            response = Some(line.to_string());
        }
        next_is_response = is_sentinel(line);
    }

    debug!(task = %task_id, %stream, captured = response.is_some(), "output relay finished");
    response.filter(|r| !r.is_empty())
}

fn is_sentinel(line: &str) -> bool {
    line.contains(RESULT_SENTINEL) || line.contains(ERROR_SENTINEL)
}

fn log_line(task_id: &str, stream: StreamKind, line: &str) {
    match stream {
        StreamKind::Stdout => info!(target: "taskshim::child", task = %task_id, %stream, "{line}"),
        StreamKind::Stderr => warn!(target: "taskshim::child", task = %task_id, %stream, "{line}"),
    }
}
