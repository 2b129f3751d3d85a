// SPDX-License-Identifier: MIT

//! procwave-status: the tick-based status aggregator (section 4.6). Reads
//! the Orchestrator's published [`procwave_core::ProcessRecord`] handles,
//! samples live pids for CPU%/memory via the OS, and publishes an
//! immutable [`procwave_core::StatusSnapshot`] on a fixed tick, on any
//! status transition, and on any build event.

pub mod sampler;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use procwave_core::{Clock, Event, ProcessView, StatusSnapshot, SystemClock};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;

pub use sampler::{ResourceSampler, Sample};

/// Shared, read-only-from-here process record handle (section 3 Ownership:
/// the aggregator never holds a writable reference).
pub type RecordHandle = Arc<Mutex<procwave_core::ProcessRecord>>;

/// Default sampling/publication tick (section 4.6).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Depth of the snapshot broadcast channel. Snapshots are replaceable, so a
/// slow subscriber simply lags rather than blocking publication.
pub const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

/// Drives periodic (and event-triggered) [`StatusSnapshot`] publication.
pub struct Aggregator<C: Clock = SystemClock> {
    records: BTreeMap<String, RecordHandle>,
    sampler: ResourceSampler,
    interval: Duration,
    clock: C,
    snapshots_tx: broadcast::Sender<Arc<StatusSnapshot>>,
    last_timestamp: u64,
}

impl<C: Clock> Aggregator<C> {
    pub fn new(
        records: BTreeMap<String, RecordHandle>,
        clock: C,
        interval: Duration,
    ) -> (Self, broadcast::Receiver<Arc<StatusSnapshot>>) {
        let (snapshots_tx, snapshots_rx) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let aggregator = Self {
            records,
            sampler: ResourceSampler::new(),
            interval,
            clock,
            snapshots_tx,
            last_timestamp: 0,
        };
        (aggregator, snapshots_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StatusSnapshot>> {
        self.snapshots_tx.subscribe()
    }

    /// Tick on `interval`, publishing a fresh snapshot on every tick and on
    /// every engine event (status transitions and build updates both arrive
    /// on `events`), until `events` closes or `cancel` fires.
    pub async fn run(mut self, mut events: mpsc::Receiver<Event>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; consume it without an extra
        // publish since we publish once unconditionally below.
        ticker.tick().await;
        self.publish().await;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                _ = ticker.tick() => self.publish().await,
                event = events.recv() => match event {
                    Some(_) => self.publish().await,
                    None => return,
                },
            }
        }
    }

    async fn publish(&mut self) {
        let mut processes = BTreeMap::new();
        for (name, handle) in &self.records {
            let record = handle.lock().await.clone();
            let mut view = ProcessView { cpu_percent: None, memory_mb: None, uptime_ms: None, record };

            if let Some(pid) = view.record.pid {
                let sample = self.sampler.sample(pid);
                sampler::apply_sample(&mut view, sample);
            }
            if view.record.status.has_live_pid() {
                if let Some(start) = view.record.start_time {
                    view.uptime_ms = Some(self.clock.epoch_ms().saturating_sub(start));
                }
            }

            processes.insert(name.clone(), view);
        }

        // Emission order must be monotonic in timestamp (section 4.6
        // invariant); a tick and an event-triggered publish can otherwise
        // land in the same millisecond.
        let mut timestamp = self.clock.epoch_ms();
        if timestamp <= self.last_timestamp {
            timestamp = self.last_timestamp + 1;
        }
        self.last_timestamp = timestamp;

        let snapshot = Arc::new(StatusSnapshot::new(timestamp, processes));
        debug_assert!(snapshot.summary_is_consistent());
        let _ = self.snapshots_tx.send(snapshot);
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
