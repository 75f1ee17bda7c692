// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every task-level option can also come from the environment, which is how
//! container schedulers usually hand them over.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::handler::SourceSettings;
use crate::types::parse_duration;

/// Command-line arguments for `taskshim`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskshim",
    version,
    about = "Run a task binary with a payload, enforce its time budget, and report the outcome.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional config file (TOML) with `[task]` / `[interruption]` sections.
    #[arg(long, value_name = "PATH", env = "TASK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Wall-clock budget for the task, e.g. `90s`, `10m`.
    #[arg(long, value_name = "DURATION", env = "TASK_TIMEOUT", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Heartbeat interval; `0` disables heartbeats.
    #[arg(long, value_name = "DURATION", env = "TASK_HEARTBEAT", value_parser = parse_duration)]
    pub heartbeat: Option<Duration>,

    /// Cancel the task when the instance is about to be reclaimed.
    #[arg(long, env = "TASK_TRACK_INTERRUPTION")]
    pub track_interruption: bool,

    /// Override the metadata endpoint polled for interruption notices.
    #[arg(long, value_name = "URL", env = "TASK_METADATA_URL")]
    pub metadata_url: Option<String>,

    /// Task payload handed to the child on stdin and in `TASK_PAYLOAD`.
    #[arg(long, value_name = "JSON", env = "TASK_PAYLOAD", hide_env_values = true)]
    pub payload: Option<String>,

    /// Workflow task token.
    #[arg(long, value_name = "TOKEN", env = "TASK_TOKEN", hide_env_values = true)]
    pub task_token: Option<String>,

    /// Queue to poll for a task.
    #[arg(long, value_name = "URL", env = "TASK_QUEUE_URL")]
    pub queue_url: Option<String>,

    /// Workflow activity to poll for a task.
    #[arg(long, value_name = "ARN", env = "TASK_ACTIVITY_ARN")]
    pub activity_arn: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKSHIM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Program to run followed by its arguments. Overrides `[task].command`.
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl CliArgs {
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            task_token: self.task_token.clone(),
            payload: self.payload.clone(),
            queue_url: self.queue_url.clone(),
            activity_arn: self.activity_arn.clone(),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_command_keeps_its_own_flags() {
        let args = CliArgs::try_parse_from([
            "taskshim",
            "--timeout",
            "2m",
            "--heartbeat",
            "0",
            "node",
            "worker.js",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(args.timeout, Some(Duration::from_secs(120)));
        assert_eq!(args.heartbeat, Some(Duration::ZERO));
        assert_eq!(args.command, vec!["node", "worker.js", "--verbose"]);
    }

    #[test]
    fn invalid_duration_is_rejected() {
        assert!(CliArgs::try_parse_from(["taskshim", "--timeout", "soon", "node"]).is_err());
    }

    #[test]
    fn source_settings_carry_the_payload() {
        let args = CliArgs::try_parse_from(["taskshim", "--payload", "{}", "true"]).unwrap();
        assert_eq!(args.source_settings().payload.as_deref(), Some("{}"));
        assert!(args.source_settings().task_token.is_none());
    }
}
