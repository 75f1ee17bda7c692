// src/exec/backend.rs

//! Pluggable execution abstraction.
//!
//! The binary entry point talks to an `Executable` instead of a concrete
//! [`Supervisor`]. Tests can drive the same wiring with a fake that never
//! spawns a process.

use std::future::Future;
use std::pin::Pin;

use crate::handler::MessageHandler;
use crate::types::TaskResult;

use super::supervisor::Supervisor;

/// Boxed future returned by [`Executable::execute`].
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = Option<TaskResult>> + Send + 'a>>;

/// Something that can take one task from a handler and run it to completion.
///
/// Production code uses [`Supervisor`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait Executable: Send + Sync {
    /// Run at most one task. `None` means the handler had no work.
    fn execute<'a>(&'a self, handler: &'a mut dyn MessageHandler) -> ExecuteFuture<'a>;
}

impl Executable for Supervisor {
    fn execute<'a>(&'a self, handler: &'a mut dyn MessageHandler) -> ExecuteFuture<'a> {
        Box::pin(Supervisor::execute(self, handler))
    }
}
