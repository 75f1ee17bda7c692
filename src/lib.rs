// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod handler;
pub mod interrupt;
pub mod logging;
pub mod types;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, load_optional};
use crate::exec::{Executable, Supervisor};
use crate::handler::{MessageHandler, TaskSource, build_handler};
use crate::types::format_duration;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI / environment overrides)
/// - task source detection and handler construction
/// - the supervisor
///
/// Returns the exit status the shim should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = resolve_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg, &args);
        return Ok(0);
    }

    let source = TaskSource::detect(&args.source_settings())?;
    info!(source = source.kind(), "task source detected");
    let mut handler = build_handler(&source)?;

    let supervisor = Supervisor::new(cfg.task).with_interruption(cfg.interruption);
    Ok(run_with(&supervisor, handler.as_mut()).await)
}

/// Run one task through `exec` and map the outcome to an exit status.
///
/// No work is not an error: it exits with 0.
pub async fn run_with(exec: &dyn Executable, handler: &mut dyn MessageHandler) -> i32 {
    match exec.execute(handler).await {
        Some(result) => result.exit_code(),
        None => 0,
    }
}

/// Load the optional config file and layer CLI / environment values on top.
pub fn resolve_config(args: &CliArgs) -> errors::Result<ConfigFile> {
    let mut raw = load_optional(args.config.as_deref())?;
    apply_cli_overrides(&mut raw, args);
    ConfigFile::try_from(raw)
}

fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some((command, rest)) = args.command.split_first() {
        raw.task.command = Some(command.clone());
        raw.task.args = rest.to_vec();
    }
    if args.timeout.is_some() {
        raw.task.timeout = args.timeout;
    }
    if args.heartbeat.is_some() {
        raw.task.heartbeat = args.heartbeat;
    }
    if args.track_interruption {
        raw.task.track_interruption = Some(true);
    }
    if let Some(url) = &args.metadata_url {
        raw.interruption.url = Some(url.clone());
    }
}

/// Simple dry-run output: print what would run and where the task comes from.
fn print_dry_run(cfg: &ConfigFile, args: &CliArgs) {
    let task = &cfg.task;

    println!("taskshim dry-run");
    println!("  command: {}", task.binary);
    if !task.args.is_empty() {
        println!("  args: {:?}", task.args);
    }
    println!("  timeout: {}", format_duration(task.timeout));
    if task.heartbeat.is_zero() {
        println!("  heartbeat: disabled");
    } else {
        println!("  heartbeat: {}", format_duration(task.heartbeat));
    }
    if task.track_interruption {
        println!("  track_interruption: true");
        println!("      url: {}", cfg.interruption.url);
        println!(
            "      poll_interval: {}",
            format_duration(cfg.interruption.poll_interval)
        );
    }

    match TaskSource::detect(&args.source_settings()) {
        Ok(source) => println!("  source: {}", source.kind()),
        Err(e) => println!("  source: none ({e})"),
    }

    debug!("dry-run complete (no execution)");
}
