// src/config/validate.rs

use crate::config::model::{
    ConfigFile, DEFAULT_HEARTBEAT, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TIMEOUT, InterruptionConfig, RawConfigFile, TaskDefinition,
};
use crate::errors::{Result, ShimError};
use crate::interrupt::METADATA_URL;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ShimError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let task = validate_task(&raw)?;
        let interruption = validate_interruption(&raw)?;
        Ok(ConfigFile::new_unchecked(task, interruption))
    }
}

fn validate_task(cfg: &RawConfigFile) -> Result<TaskDefinition> {
    let binary = cfg
        .task
        .command
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            ShimError::ConfigError(
                "no command given: pass it on the command line or set [task].command".to_string(),
            )
        })?;

    let timeout = cfg.task.timeout.unwrap_or(DEFAULT_TIMEOUT);
    if timeout.is_zero() {
        return Err(ShimError::ConfigError(
            "[task].timeout must be greater than zero".to_string(),
        ));
    }

    Ok(TaskDefinition {
        binary: binary.to_string(),
        args: cfg.task.args.clone(),
        timeout,
        heartbeat: cfg.task.heartbeat.unwrap_or(DEFAULT_HEARTBEAT),
        track_interruption: cfg.task.track_interruption.unwrap_or(false),
    })
}

fn validate_interruption(cfg: &RawConfigFile) -> Result<InterruptionConfig> {
    let section = &cfg.interruption;

    let url = section
        .url
        .clone()
        .unwrap_or_else(|| METADATA_URL.to_string());
    if url.trim().is_empty() {
        return Err(ShimError::ConfigError(
            "[interruption].url must not be empty".to_string(),
        ));
    }

    let poll_interval = section.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
    if poll_interval.is_zero() {
        return Err(ShimError::ConfigError(
            "[interruption].poll_interval must be greater than zero".to_string(),
        ));
    }

    let request_timeout = section.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
    if request_timeout.is_zero() {
        return Err(ShimError::ConfigError(
            "[interruption].request_timeout must be greater than zero".to_string(),
        ));
    }

    Ok(InterruptionConfig {
        url,
        poll_interval,
        request_timeout,
    })
}
