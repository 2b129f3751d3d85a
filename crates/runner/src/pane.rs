// SPDX-License-Identifier: MIT

//! Pane execution strategy (section 4.3): hand the command to a multiplexer
//! pane and trust its own lifecycle. No in-band output capture — readiness
//! for a Pane-strategy process must come from a ready check that doesn't
//! require Direct (anything other than `log-pattern`, per
//! [`procwave_core::ReadyCheck::requires_direct_strategy`]).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use procwave_core::{BuildInfo, PaneHandle, ProcessEvent};
use tokio::sync::broadcast;

use crate::error::RunnerError;
use crate::multiplexer::MultiplexerDriver;
use crate::{Runner, EVENT_CHANNEL_CAPACITY};

/// Runs a command inside a multiplexer pane rather than as a direct child.
pub struct PaneRunner {
    driver: Arc<dyn MultiplexerDriver>,
    category: String,
    name: String,
    command: String,
    cwd: PathBuf,
    events_tx: broadcast::Sender<ProcessEvent>,
    pane: Option<PaneHandle>,
}

impl PaneRunner {
    pub fn new(
        driver: Arc<dyn MultiplexerDriver>,
        category: impl Into<String>,
        name: impl Into<String>,
        command: impl Into<String>,
        cwd: PathBuf,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { driver, category: category.into(), name: name.into(), command: command.into(), cwd, events_tx, pane: None }
    }

    pub fn pane_handle(&self) -> Option<PaneHandle> {
        self.pane
    }
}

#[async_trait]
impl Runner for PaneRunner {
    async fn start(&mut self) -> Result<(), RunnerError> {
        let pane = self
            .driver
            .create_pane(&self.category, &self.name, &self.command, Some(&self.cwd))
            .await?;
        self.pane = Some(pane);
        // Pane strategy has no process-output signal of its own; the spec
        // treats pane creation as "running" unless a ready check says
        // otherwise (section 4.3: Pane readiness is whatever the configured
        // check — never log-pattern — determines).
        let _ = self.events_tx.send(ProcessEvent::Ready);
        Ok(())
    }

    async fn stop(&mut self, _graceful_timeout: Duration) -> Result<(), RunnerError> {
        if self.pane.take().is_none() {
            return Err(RunnerError::NotRunning);
        }
        // Killing the whole session is the multiplexer driver's only
        // teardown primitive; per-pane process termination is left to the
        // pane's own shell (e.g. the dev server receiving a signal when its
        // pane closes).
        self.driver.kill_session().await?;
        let _ = self.events_tx.send(ProcessEvent::Exit { code: None, signal: None });
        Ok(())
    }

    fn pid(&self) -> Option<u32> {
        None
    }

    fn build_info(&self) -> Option<BuildInfo> {
        None
    }

    fn subscribe(&self) -> broadcast::Receiver<ProcessEvent> {
        self.events_tx.subscribe()
    }
}

#[cfg(test)]
#[path = "pane_tests.rs"]
mod tests;
