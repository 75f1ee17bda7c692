// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`supervisor`] runs one task: spawn, race, report.
//! - [`relay`] feeds the payload to the child and scans its output for
//!   sentinel-marked responses.
//! - [`heartbeat`] ticks at a fixed interval while the child runs.
//! - [`shutdown`] interrupts, then kills, a child that has to go.
//! - [`backend`] provides the `Executable` trait so callers can swap the
//!   supervisor for a fake in tests.

pub mod backend;
pub mod heartbeat;
pub mod relay;
pub mod shutdown;
pub mod supervisor;

pub use backend::{ExecuteFuture, Executable};
pub use heartbeat::HeartbeatEmitter;
pub use supervisor::{OUTPUT_DRAIN, Supervisor, error_label};
