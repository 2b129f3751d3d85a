// SPDX-License-Identifier: MIT

//! Wire records (section 4.7): newline-delimited JSON, one `type`-tagged
//! value per line.

use procwave_core::{LogLevel, ProcessView};
use serde::{Deserialize, Serialize};

/// Best-effort host-wide metrics attached to a `status_update` (optional
/// per the wire table; the engine's own invariants don't require it, so we
/// only ever populate it with `None` today — kept so the wire shape matches
/// section 4.7's table verbatim and a future caller can fill it in without
/// a breaking wire change).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemMetrics {
    pub cpu_percent: Option<f32>,
    pub memory_mb: Option<f32>,
}

/// Action a `command` record requests of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Start,
    Stop,
    Restart,
}

/// One line of the control-socket protocol (section 4.7 wire table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    StatusUpdate {
        timestamp: u64,
        processes: Vec<ProcessView>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        system_metrics: Option<SystemMetrics>,
    },
    Log {
        process_name: String,
        timestamp: u64,
        level: LogLevel,
        content: String,
    },
    Command {
        action: CommandAction,
        process_name: String,
    },
    CommandResponse {
        success: bool,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
}

impl WireMessage {
    /// Serialize as one newline-delimited JSON line, including the
    /// trailing `\n` the wire format requires between records.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
