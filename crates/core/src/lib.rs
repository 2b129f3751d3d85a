// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-core: domain types for the process supervision engine.
//!
//! Everything here is data: specs are immutable, records are mutated only
//! by their owning supervisor, snapshots are immutable once emitted. No
//! other crate in this workspace should need to reach past these types to
//! model what a process is or what happened to it.

pub mod macros;

pub mod clock;
pub mod event;
pub mod id;
pub mod process_record;
pub mod process_spec;
pub mod ready_check;
pub mod snapshot;
pub mod wave;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{Event, LogLevel, ProcessEvent};
pub use id::short;
pub use process_record::{BuildInfo, HealthCheckStatus, PaneHandle, ProcessRecord, ProcessStatus};
#[cfg(any(test, feature = "test-support"))]
pub use process_spec::ProcessSpecBuilder;
pub use process_spec::{
    ExecutionStrategy, Hooks, IntegrationMode, ProcessSpec, RestartPolicy, RunnerKind,
    DEFAULT_HOOK_TIMEOUT,
};
pub use ready_check::{
    ProbeOutcome, ReadyCheck, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT,
};
pub use snapshot::{ProcessView, StatusSnapshot, Summary};
pub use wave::Waves;

define_id! {
    /// Identifier for one orchestrator run, stamped on every emitted event
    /// and snapshot so a restarted engine's broadcast stream can be told
    /// apart from a prior run's (data model supplement).
    pub struct RunId("run-");
}

define_id! {
    /// Identifier for one connected broadcast-server client.
    pub struct ClientId("cli-");
}
