// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::types::parse_duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration as read from an optional TOML file, before CLI overrides
/// and validation.
///
/// ```toml
/// [task]
/// command = "node"
/// args = ["worker.js"]
/// timeout = "10m"
/// heartbeat = "30s"
/// track_interruption = true
///
/// [interruption]
/// poll_interval = "5s"
/// ```
///
/// Every field is optional; defaults are applied during validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub task: RawTaskSection,

    #[serde(default)]
    pub interruption: RawInterruptionSection,
}

/// `[task]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTaskSection {
    /// Program to run (looked up on `PATH`).
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Wall-clock budget for the child.
    #[serde(default, deserialize_with = "opt_duration")]
    pub timeout: Option<Duration>,

    /// Heartbeat interval; `"0s"` disables heartbeats.
    #[serde(default, deserialize_with = "opt_duration")]
    pub heartbeat: Option<Duration>,

    /// Watch the metadata endpoint for spot interruptions.
    pub track_interruption: Option<bool>,
}

/// `[interruption]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawInterruptionSection {
    pub url: Option<String>,

    #[serde(default, deserialize_with = "opt_duration")]
    pub poll_interval: Option<Duration>,

    #[serde(default, deserialize_with = "opt_duration")]
    pub request_timeout: Option<Duration>,
}

fn opt_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_duration(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// What to run and under which limits. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub binary: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub heartbeat: Duration,
    pub track_interruption: bool,
}

impl TaskDefinition {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            heartbeat: DEFAULT_HEARTBEAT,
            track_interruption: false,
        }
    }
}

/// Metadata endpoint polling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptionConfig {
    pub url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for InterruptionConfig {
    fn default() -> Self {
        Self {
            url: crate::interrupt::METADATA_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Validated configuration. Only obtainable through
/// `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub task: TaskDefinition,
    pub interruption: InterruptionConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(task: TaskDefinition, interruption: InterruptionConfig) -> Self {
        Self { task, interruption }
    }
}
