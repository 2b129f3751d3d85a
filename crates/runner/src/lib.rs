// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-runner: the two execution strategies a process can use (section
//! 4.3). [`direct::DirectRunner`] spawns the child in-process and parses its
//! output; [`pane::PaneRunner`] hands the command to a multiplexer pane and
//! captures nothing. Both speak the same [`Runner`] trait so the supervisor
//! never branches on strategy.

pub mod direct;
pub mod error;
pub mod multiplexer;
pub mod pane;
pub mod parser;

use std::time::Duration;

use async_trait::async_trait;
use procwave_core::{BuildInfo, ProcessEvent};
use tokio::sync::broadcast;

pub use error::RunnerError;

/// What a runner must do regardless of execution strategy (section 4.3).
#[async_trait]
pub trait Runner: Send {
    /// Launch the child. Idempotent only in the sense that calling it twice
    /// without an intervening `stop` is a logic error the caller must avoid;
    /// the runner itself does not guard against it.
    async fn start(&mut self) -> Result<(), RunnerError>;

    /// Stop the child, waiting up to `graceful_timeout` for a clean exit
    /// before escalating (section 4.4: SIGTERM, then SIGKILL after timeout).
    async fn stop(&mut self, graceful_timeout: Duration) -> Result<(), RunnerError>;

    /// Stop then start again. The default composition is correct for every
    /// runner; only override it if restart needs to skip teardown steps.
    async fn restart(&mut self, graceful_timeout: Duration) -> Result<(), RunnerError> {
        self.stop(graceful_timeout).await?;
        self.start().await
    }

    /// The child's OS pid, if currently running. `None` for Pane strategy,
    /// which never observes one.
    fn pid(&self) -> Option<u32>;

    /// Latest build metrics, for bundler/ui-build/dev-server runner kinds.
    fn build_info(&self) -> Option<BuildInfo>;

    /// Subscribe to this runner's event stream. Each call returns an
    /// independent receiver over the same broadcast channel.
    fn subscribe(&self) -> broadcast::Receiver<ProcessEvent>;
}

/// Default channel capacity for a runner's event broadcast. Generous enough
/// to absorb a burst of log lines between a slow subscriber's polls without
/// forcing every consumer to keep pace in lockstep.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
