// SPDX-License-Identifier: MIT

//! Raw, TOML-shaped deserialization types.
//!
//! These mirror [`procwave_core`]'s domain types field-for-field but keep
//! durations as the suffixed strings the document format uses (section 6:
//! `"250ms"`, `"30s"`, `"2m"`, `"1h"`). [`crate::loader`] converts each
//! `*Def` into its core counterpart, parsing durations and rejecting
//! structurally invalid combinations along the way.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use procwave_core::{ExecutionStrategy, IntegrationMode, ReadyCheck, RestartPolicy, RunnerKind};

use crate::duration::parse_duration;
use crate::error::ConfigError;

fn default_expected_status() -> u16 {
    200
}
fn default_timeout_str() -> String {
    "60s".to_string()
}
fn default_interval_str() -> String {
    "1s".to_string()
}
fn default_max_attempts() -> u32 {
    60
}
fn default_restart_delay_str() -> String {
    "0ms".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ReadyCheckDef {
    Http {
        url: String,
        #[serde(default = "default_expected_status")]
        expected_status: u16,
        #[serde(default = "default_timeout_str")]
        timeout: String,
        #[serde(default = "default_interval_str")]
        interval: String,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
    Tcp {
        host: String,
        port: u16,
        #[serde(default = "default_timeout_str")]
        timeout: String,
        #[serde(default = "default_interval_str")]
        interval: String,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
    ExitCode {
        #[serde(default = "default_timeout_str")]
        timeout: String,
    },
    LogPattern {
        pattern: String,
        #[serde(default = "default_timeout_str")]
        timeout: String,
    },
    Custom {
        command: String,
        #[serde(default = "default_timeout_str")]
        timeout: String,
        #[serde(default = "default_interval_str")]
        interval: String,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
}

impl ReadyCheckDef {
    pub(crate) fn into_ready_check(self) -> Result<ReadyCheck, String> {
        Ok(match self {
            ReadyCheckDef::Http { url, expected_status, timeout, interval, max_attempts } => {
                ReadyCheck::Http {
                    url,
                    expected_status,
                    timeout: parse_duration(&timeout)?,
                    interval: parse_duration(&interval)?,
                    max_attempts,
                }
            }
            ReadyCheckDef::Tcp { host, port, timeout, interval, max_attempts } => ReadyCheck::Tcp {
                host,
                port,
                timeout: parse_duration(&timeout)?,
                interval: parse_duration(&interval)?,
                max_attempts,
            },
            ReadyCheckDef::ExitCode { timeout } => {
                ReadyCheck::ExitCode { timeout: parse_duration(&timeout)? }
            }
            ReadyCheckDef::LogPattern { pattern, timeout } => {
                ReadyCheck::LogPattern { pattern, timeout: parse_duration(&timeout)? }
            }
            ReadyCheckDef::Custom { command, timeout, interval, max_attempts } => {
                ReadyCheck::Custom {
                    command,
                    timeout: parse_duration(&timeout)?,
                    interval: parse_duration(&interval)?,
                    max_attempts,
                }
            }
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksDef {
    pub pre_start: Option<String>,
    pub post_start: Option<String>,
    pub pre_stop: Option<String>,
    pub post_stop: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessSpecDef {
    #[serde(default)]
    pub category: String,
    pub command: String,
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    #[serde(default = "default_restart_delay_str")]
    pub restart_delay: String,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub ready_check: Option<ReadyCheckDef>,
    pub hooks: Option<HooksDef>,
    #[serde(default)]
    pub runner_kind: RunnerKind,
    pub integration_mode: Option<IntegrationMode>,
    #[serde(default)]
    pub strategy: ExecutionStrategy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreflightCheckDef {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub fix_suggestion: Option<String>,
    #[serde(default = "default_timeout_str")]
    pub timeout: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreflightDef {
    #[serde(default)]
    pub checks: Vec<PreflightCheckDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootOptionsDef {
    /// Whether the engine should create a multiplexer session at all
    /// (section 4.8 `start()`: "if enabled, creates the multiplexer session").
    #[serde(default = "default_true")]
    pub use_multiplexer: bool,
    #[serde(default = "default_graceful_stop_str")]
    pub graceful_stop_timeout: String,
    #[serde(default = "default_status_tick_str")]
    pub status_tick_interval: String,
}

fn default_true() -> bool {
    true
}
fn default_graceful_stop_str() -> String {
    "10s".to_string()
}
fn default_status_tick_str() -> String {
    "1s".to_string()
}

#[derive(Debug, Clone)]
pub struct BootOptions {
    pub use_multiplexer: bool,
    pub graceful_stop_timeout: Duration,
    pub status_tick_interval: Duration,
}

impl BootOptionsDef {
    pub(crate) fn into_boot_options(self) -> Result<BootOptions, ConfigError> {
        Ok(BootOptions {
            use_multiplexer: self.use_multiplexer,
            graceful_stop_timeout: parse_duration(&self.graceful_stop_timeout).map_err(|message| {
                ConfigError::InvalidProcess { process: "boot".to_string(), message }
            })?,
            status_tick_interval: parse_duration(&self.status_tick_interval).map_err(
                |message| ConfigError::InvalidProcess { process: "boot".to_string(), message },
            )?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    pub project: String,
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
    pub processes: BTreeMap<String, ProcessSpecDef>,
    #[serde(default)]
    pub hooks: HooksDef,
    #[serde(default)]
    pub preflight: PreflightDef,
    #[serde(default)]
    pub boot: BootOptionsDef,
}
