// SPDX-License-Identifier: MIT

//! Best-effort OS resource sampling for live pids (section 4.6).

use procwave_core::ProcessView;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One sampled resource reading for a live pid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sample {
    pub cpu_percent: Option<f32>,
    pub memory_mb: Option<f32>,
}

/// Wraps a [`System`] so repeated samples reuse the same process table
/// rather than re-enumerating `/proc` (or the platform equivalent) on
/// every tick.
pub struct ResourceSampler {
    system: System,
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self { system: System::new() }
    }
}

impl ResourceSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh and read CPU%/memory for one pid. `None` on any failure
    /// (process gone, permission denied) — callers retain the previous
    /// reading rather than treat this as fatal.
    pub fn sample(&mut self, pid: u32) -> Option<Sample> {
        let pid = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );
        let process = self.system.process(pid)?;
        Some(Sample {
            cpu_percent: Some(process.cpu_usage()),
            memory_mb: Some(process.memory() as f32 / (1024.0 * 1024.0)),
        })
    }
}

/// Apply a sample onto a [`ProcessView`] in place, leaving prior values
/// untouched when sampling failed (staleness is implicit via the
/// snapshot timestamp, per section 4.6).
pub fn apply_sample(view: &mut ProcessView, sample: Option<Sample>) {
    if let Some(sample) = sample {
        if sample.cpu_percent.is_some() {
            view.cpu_percent = sample.cpu_percent;
        }
        if sample.memory_mb.is_some() {
            view.memory_mb = sample.memory_mb;
        }
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
