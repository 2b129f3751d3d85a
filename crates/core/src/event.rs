// SPDX-License-Identifier: MIT

//! Explicit, enumerated engine events (section 4.8, section 9 design notes).
//!
//! The source pattern this replaces is an event-emitter with stringly-typed
//! topics; here every event is a typed variant so a downstream component
//! can exhaustively match and narrow rather than string-compare topic names.

use serde::{Deserialize, Serialize};

use crate::process_record::{BuildInfo, ProcessStatus};

/// A single captured output line from a Direct-strategy child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Stdout,
    Stderr,
}

/// Per-process runner/supervisor events (section 4.3 event vocabulary).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessEvent {
    Status { status: ProcessStatus },
    Log { level: LogLevel, content: String },
    Ready,
    Failed { reason: String },
    Exit { code: Option<i32>, signal: Option<i32> },
    BuildStart,
    BuildProgress { info: BuildInfo },
    BuildComplete { info: BuildInfo },
    BuildFailed { info: BuildInfo },
}

/// Top-level orchestrator events (section 4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    ProcessStarting { name: String },
    ProcessReady { name: String },
    ProcessStatus { name: String, status: ProcessStatus },
    ProcessFailed { name: String, reason: String },
    ProcessRestarting { name: String, attempt: u32 },
    ProcessStopped { name: String },
    /// A bundler/ui-build/dev-server runner reported new build metrics.
    ProcessBuildUpdate { name: String, info: BuildInfo },
    /// One captured output line from a Direct-strategy child (section 4.7
    /// `log` wire message). Pane strategy captures no output, so this never
    /// fires for panes.
    ProcessLog { name: String, level: LogLevel, content: String },
    AllReady,
    StatusUpdate,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
