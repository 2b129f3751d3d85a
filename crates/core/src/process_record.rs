// SPDX-License-Identifier: MIT

//! Mutable per-process state, owned exclusively by that process's Supervisor.

use serde::{Deserialize, Serialize};

use crate::define_id;

define_id! {
    /// Opaque handle to a multiplexer pane, if the process uses one.
    pub struct PaneHandle("pane");
}

/// Lifecycle status of a single process (section 3, section 4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Pending,
    Starting,
    Building,
    Running,
    Failed,
    Stopped,
}

crate::simple_display! {
    ProcessStatus {
        Pending => "pending",
        Starting => "starting",
        Building => "building",
        Running => "running",
        Failed => "failed",
        Stopped => "stopped",
    }
}

impl ProcessStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessStatus::Failed | ProcessStatus::Stopped)
    }

    pub fn has_live_pid(self) -> bool {
        matches!(self, ProcessStatus::Starting | ProcessStatus::Building | ProcessStatus::Running)
    }
}

/// Health-check status tracked alongside [`ProcessStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCheckStatus {
    Pending,
    Checking,
    Passed,
    Failed,
}

crate::simple_display! {
    HealthCheckStatus {
        Pending => "pending",
        Checking => "checking",
        Passed => "passed",
        Failed => "failed",
    }
}

/// Build metrics reported by bundler/ui-build/dev-server runners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub progress: u8,
    pub errors: u32,
    pub warnings: u32,
    pub duration_ms: Option<u64>,
    pub size_bytes: Option<u64>,
    pub last_build_success: Option<bool>,
}

/// Mutable per-process state. One instance per [`crate::process_spec::ProcessSpec`],
/// owned exclusively by that process's Supervisor task (section 3 Ownership).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub name: String,
    pub status: ProcessStatus,
    pub pid: Option<u32>,
    pub start_time: Option<u64>,
    pub stop_time: Option<u64>,
    pub restart_count: u32,
    pub build_info: Option<BuildInfo>,
    pub pane_handle: Option<PaneHandle>,
    pub health_check_status: HealthCheckStatus,
    /// Exit code of the most recently terminated child, if any. Supplements
    /// the distilled attribute list (section 3 of SPEC_FULL.md) — required
    /// to evaluate `on-failure` and the `exit-code` ready check.
    pub last_exit_code: Option<i32>,
    pub last_exit_signal: Option<i32>,
}

impl ProcessRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ProcessStatus::Pending,
            pid: None,
            start_time: None,
            stop_time: None,
            restart_count: 0,
            build_info: None,
            pane_handle: None,
            health_check_status: HealthCheckStatus::Pending,
            last_exit_code: None,
            last_exit_signal: None,
        }
    }

    /// Invariant (section 3): `pid != null` implies status is one of
    /// starting/building/running.
    pub fn check_pid_invariant(&self) -> bool {
        self.pid.is_none() || self.status.has_live_pid()
    }

    /// Invariant (section 3 / section 8 property 4): restart_count never
    /// exceeds max_retries under on-failure/always policies. Callers pass
    /// the spec's max_retries since the record itself doesn't hold it.
    pub fn check_restart_budget(&self, max_retries: u32) -> bool {
        self.restart_count <= max_retries
    }
}

#[cfg(test)]
#[path = "process_record_tests.rs"]
mod tests;
