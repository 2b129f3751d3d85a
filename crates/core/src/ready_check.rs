// SPDX-License-Identifier: MIT

//! Readiness check specifications (section 3 / section 4.5 of the spec).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default probe numerics (section 4.5): 60s timeout, 1s interval, 60 attempts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// A readiness check attached to a [`crate::process_spec::ProcessSpec`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ReadyCheck {
    Http {
        url: String,
        #[serde(default = "default_http_status")]
        expected_status: u16,
        #[serde(default = "default_timeout")]
        timeout: Duration,
        #[serde(default = "default_interval")]
        interval: Duration,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
    Tcp {
        host: String,
        port: u16,
        #[serde(default = "default_timeout")]
        timeout: Duration,
        #[serde(default = "default_interval")]
        interval: Duration,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
    ExitCode {
        #[serde(default = "default_timeout")]
        timeout: Duration,
    },
    LogPattern {
        pattern: String,
        #[serde(default = "default_timeout")]
        timeout: Duration,
    },
    Custom {
        command: String,
        #[serde(default = "default_timeout")]
        timeout: Duration,
        #[serde(default = "default_interval")]
        interval: Duration,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
}

fn default_http_status() -> u16 {
    200
}
fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}
fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl ReadyCheck {
    pub fn timeout(&self) -> Duration {
        match self {
            ReadyCheck::Http { timeout, .. }
            | ReadyCheck::Tcp { timeout, .. }
            | ReadyCheck::ExitCode { timeout }
            | ReadyCheck::LogPattern { timeout, .. }
            | ReadyCheck::Custom { timeout, .. } => *timeout,
        }
    }

    /// `log-pattern` is only available under the Direct execution strategy
    /// (section 4.5); Pane-bound processes must reject it at configuration
    /// load time.
    pub fn requires_direct_strategy(&self) -> bool {
        matches!(self, ReadyCheck::LogPattern { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ReadyCheck::Http { .. } => "http",
            ReadyCheck::Tcp { .. } => "tcp",
            ReadyCheck::ExitCode { .. } => "exit-code",
            ReadyCheck::LogPattern { .. } => "log-pattern",
            ReadyCheck::Custom { .. } => "custom",
        }
    }
}

/// Outcome of a single probe run, returned by the Readiness Prober (section 4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Ready,
    Timeout,
    Failed,
}

#[cfg(test)]
#[path = "ready_check_tests.rs"]
mod tests;
