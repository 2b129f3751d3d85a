// SPDX-License-Identifier: MIT

//! Immutable, timestamped status snapshots (section 3, section 4.6).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::process_record::{ProcessRecord, ProcessStatus};

/// Counts of processes in each status, always consistent with the
/// per-process statuses in the same snapshot (section 8 testable property 6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub running: u32,
    pub building: u32,
    pub failed: u32,
    pub stopped: u32,
    pub starting: u32,
    pub pending: u32,
}

impl Summary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ProcessRecord>) -> Self {
        let mut summary = Summary::default();
        for record in records {
            match record.status {
                ProcessStatus::Running => summary.running += 1,
                ProcessStatus::Building => summary.building += 1,
                ProcessStatus::Failed => summary.failed += 1,
                ProcessStatus::Stopped => summary.stopped += 1,
                ProcessStatus::Starting => summary.starting += 1,
                ProcessStatus::Pending => summary.pending += 1,
            }
        }
        summary
    }
}

/// A view of a [`ProcessRecord`] plus sampled resource usage, as carried by
/// a snapshot. Distinct from `ProcessRecord` because the engine never hands
/// out a writable reference to the supervisor-owned record (section 3
/// Ownership).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessView {
    #[serde(flatten)]
    pub record: ProcessRecord,
    pub cpu_percent: Option<f32>,
    pub memory_mb: Option<f32>,
    pub uptime_ms: Option<u64>,
}

/// Immutable value published on a time interval or on any state change
/// (section 3, section 4.6). Never mutated after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub timestamp: u64,
    pub processes: BTreeMap<String, ProcessView>,
    pub summary: Summary,
}

impl StatusSnapshot {
    pub fn new(timestamp: u64, processes: BTreeMap<String, ProcessView>) -> Self {
        let summary = Summary::from_records(processes.values().map(|v| &v.record));
        Self { timestamp, processes, summary }
    }

    /// Section 8 testable property 6: summary counts equal the per-process
    /// tallies within this same snapshot.
    pub fn summary_is_consistent(&self) -> bool {
        Summary::from_records(self.processes.values().map(|v| &v.record)) == self.summary
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
