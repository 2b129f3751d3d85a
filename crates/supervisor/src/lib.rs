// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-supervisor: the per-process lifecycle state machine (section
//! 4.4). One [`Supervisor`] owns exactly one [`procwave_core::ProcessSpec`],
//! runs as its own task (section 5), and mutates only its own
//! [`procwave_core::ProcessRecord`] — the Orchestrator holds the full set
//! but never writes into one directly.

pub mod error;
pub mod hooks;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use procwave_core::{
    BuildInfo, Clock, Event, ProcessEvent, ProcessRecord, ProcessSpec, ProcessStatus, ReadyCheck,
    RestartPolicy, SystemClock, DEFAULT_TIMEOUT,
};
use procwave_prober::ProbeOutcome;
use procwave_runner::Runner;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;

pub use error::SupervisorError;
pub use hooks::HookError;

/// Shared, single-writer-per-process record handle (section 3 Ownership).
pub type RecordHandle = Arc<Mutex<ProcessRecord>>;

/// Bounded shutdown window applied when a Supervisor is torn down by
/// cancellation rather than an explicit `Stop` command (section 5: "shutdown
/// bound of 10s per process").
pub const CANCELLATION_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Commands a Supervisor accepts from its owning Orchestrator.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    Start,
    Stop { graceful_timeout: Duration },
    /// Manual restart. Per the resolved open question, this does **not**
    /// increment `restartCount` — that counter is reserved for restarts
    /// driven by the restart-policy table below.
    Restart { graceful_timeout: Duration },
}

/// A running Supervisor's command handle and join future.
pub struct SupervisorHandle {
    pub commands: mpsc::Sender<Command>,
    pub join: tokio::task::JoinHandle<()>,
}

/// Default depth of a Supervisor's command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

/// Spawn a Supervisor as its own task, returning a handle to command it.
pub fn spawn<C: Clock + 'static>(supervisor: Supervisor<C>) -> SupervisorHandle {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let join = tokio::spawn(supervisor.run(rx));
    SupervisorHandle { commands: tx, join }
}

pub struct Supervisor<C: Clock = SystemClock> {
    spec: Arc<ProcessSpec>,
    runner: Box<dyn Runner>,
    record: RecordHandle,
    clock: C,
    orchestrator_cwd: PathBuf,
    events_tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

impl<C: Clock> Supervisor<C> {
    pub fn new(
        spec: Arc<ProcessSpec>,
        runner: Box<dyn Runner>,
        record: RecordHandle,
        clock: C,
        orchestrator_cwd: PathBuf,
        events_tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) -> Self {
        Self { spec, runner, record, clock, orchestrator_cwd, events_tx, cancel }
    }

    /// Drive this process's lifecycle until `commands` closes or the shared
    /// cancellation token fires.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        'idle: loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                cmd = commands.recv() => match cmd {
                    Some(Command::Start) => {
                        if self.handle_start().await.is_err() {
                            continue 'idle;
                        }
                    }
                    Some(Command::Stop { .. }) => continue 'idle,
                    Some(Command::Restart { graceful_timeout }) => {
                        self.handle_stop(graceful_timeout).await;
                        if self.handle_start().await.is_err() {
                            continue 'idle;
                        }
                    }
                    None => return,
                },
            }

            let mut events = self.runner.subscribe();
            'running: loop {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => {
                        self.handle_stop(CANCELLATION_STOP_TIMEOUT).await;
                        return;
                    }
                    cmd = commands.recv() => match cmd {
                        Some(Command::Stop { graceful_timeout }) => {
                            self.handle_stop(graceful_timeout).await;
                            continue 'idle;
                        }
                        Some(Command::Restart { graceful_timeout }) => {
                            self.handle_stop(graceful_timeout).await;
                            if self.handle_start().await.is_ok() {
                                events = self.runner.subscribe();
                                continue 'running;
                            }
                            continue 'idle;
                        }
                        Some(Command::Start) => continue 'running,
                        None => {
                            self.handle_stop(CANCELLATION_STOP_TIMEOUT).await;
                            return;
                        }
                    },
                    event = events.recv() => match event {
                        Ok(ProcessEvent::Exit { code, signal }) => {
                            if self.handle_unexpected_exit(code, signal).await {
                                // A policy-driven restart succeeded; resubscribe to
                                // the new child's event stream and keep monitoring.
                                events = self.runner.subscribe();
                                continue 'running;
                            }
                            continue 'idle;
                        }
                        // A rebuild/HMR cycle toggles status between `building`
                        // and `running` without the child ever exiting; the pid
                        // stays live throughout, so only the status changes.
                        Ok(ProcessEvent::Status { status }) => {
                            self.set_status(status).await;
                            self.emit(Event::ProcessStatus { name: self.spec.name.clone(), status }).await;
                            continue 'running;
                        }
                        Ok(ProcessEvent::BuildProgress { info })
                        | Ok(ProcessEvent::BuildComplete { info })
                        | Ok(ProcessEvent::BuildFailed { info }) => {
                            self.update_build_info(info).await;
                            continue 'running;
                        }
                        Ok(ProcessEvent::Log { level, content }) => {
                            self.emit(Event::ProcessLog { name: self.spec.name.clone(), level, content }).await;
                            continue 'running;
                        }
                        Ok(_) => continue 'running,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue 'running,
                        Err(broadcast::error::RecvError::Closed) => continue 'running,
                    },
                }
            }
        }
    }

    async fn handle_start(&mut self) -> Result<(), SupervisorError> {
        if let Some(pre_start) = self.spec.hooks.as_ref().and_then(|h| h.pre_start.as_deref()) {
            if let Err(err) = self.run_hook(pre_start).await {
                self.mark_failed(&format!("pre_start hook failed: {err}")).await;
                return Err(SupervisorError::PreStartHook(err.to_string()));
            }
        }

        self.set_status(ProcessStatus::Starting).await;
        self.emit(Event::ProcessStarting { name: self.spec.name.clone() }).await;

        // Subscribed before start() so we cannot miss a synthetic `Ready`
        // that some runner kinds send synchronously as part of start()
        // itself (the broadcast channel drops events sent before a
        // receiver exists).
        let events = self.runner.subscribe();

        if let Err(err) = self.runner.start().await {
            self.mark_failed(&format!("spawn failed: {err}")).await;
            return Err(SupervisorError::Spawn(err));
        }

        {
            let mut record = self.record.lock().await;
            record.pid = self.runner.pid();
            record.start_time = Some(self.clock.epoch_ms());
        }

        match self.await_readiness(events).await {
            ProbeOutcome::Ready => {
                self.set_status(ProcessStatus::Running).await;
                self.emit(Event::ProcessReady { name: self.spec.name.clone() }).await;

                if let Some(post_start) = self.spec.hooks.as_ref().and_then(|h| h.post_start.as_deref()) {
                    if let Err(err) = self.run_hook(post_start).await {
                        tracing::warn!(
                            process = %self.spec.name,
                            error = %err,
                            "post_start hook failed (non-fatal)"
                        );
                    }
                }
                Ok(())
            }
            ProbeOutcome::Timeout => {
                self.mark_failed("readiness probe timed out").await;
                Err(SupervisorError::ProbeTimeout)
            }
            ProbeOutcome::Failed => {
                self.mark_failed("readiness probe failed").await;
                Err(SupervisorError::ProbeFailed)
            }
        }
    }

    async fn await_readiness(&self, events: broadcast::Receiver<ProcessEvent>) -> ProbeOutcome {
        if let Some(check) = &self.spec.ready_check {
            let needs_events = matches!(check, ReadyCheck::ExitCode { .. } | ReadyCheck::LogPattern { .. });
            procwave_prober::probe(check, needs_events.then_some(events), None).await
        } else {
            self.await_implicit_readiness(events).await
        }
    }

    /// No `readyCheck` configured (section 3 invariant): non-build kinds are
    /// ready the instant the runner's synthetic `Ready` event arrives (spawn
    /// for Direct, pane creation for Pane); build-style kinds wait for the
    /// parser's build-complete signal instead.
    async fn await_implicit_readiness(&self, mut events: broadcast::Receiver<ProcessEvent>) -> ProbeOutcome {
        let build_style = self.spec.runner_kind.is_build_style();
        let wait = async {
            loop {
                match events.recv().await {
                    Ok(ProcessEvent::Ready) if !build_style => return ProbeOutcome::Ready,
                    Ok(ProcessEvent::BuildComplete { .. }) if build_style => return ProbeOutcome::Ready,
                    Ok(ProcessEvent::BuildFailed { .. }) if build_style => return ProbeOutcome::Failed,
                    Ok(ProcessEvent::Exit { .. }) => return ProbeOutcome::Failed,
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return ProbeOutcome::Failed,
                }
            }
        };
        tokio::time::timeout(DEFAULT_TIMEOUT, wait).await.unwrap_or(ProbeOutcome::Timeout)
    }

    async fn handle_stop(&mut self, graceful_timeout: Duration) {
        if let Some(pre_stop) = self.spec.hooks.as_ref().and_then(|h| h.pre_stop.as_deref()) {
            if let Err(err) = self.run_hook(pre_stop).await {
                tracing::warn!(process = %self.spec.name, error = %err, "pre_stop hook failed");
            }
        }

        if let Err(err) = self.runner.stop(graceful_timeout).await {
            tracing::warn!(process = %self.spec.name, error = %err, "stop failed");
        }

        if let Some(post_stop) = self.spec.hooks.as_ref().and_then(|h| h.post_stop.as_deref()) {
            if let Err(err) = self.run_hook(post_stop).await {
                tracing::warn!(process = %self.spec.name, error = %err, "post_stop hook failed (non-fatal)");
            }
        }

        {
            let mut record = self.record.lock().await;
            record.status = ProcessStatus::Stopped;
            record.pid = None;
            record.stop_time = Some(self.clock.epoch_ms());
        }
        self.emit(Event::ProcessStopped { name: self.spec.name.clone() }).await;
    }

    /// Apply the restart-policy table to a child exit that nobody asked for
    /// (section 4.4). Returns `true` if a restart was attempted and
    /// succeeded — the caller must resume monitoring the new child.
    async fn handle_unexpected_exit(&mut self, code: Option<i32>, signal: Option<i32>) -> bool {
        let is_failure = code != Some(0);
        {
            let mut record = self.record.lock().await;
            record.pid = None;
            record.stop_time = Some(self.clock.epoch_ms());
            record.last_exit_code = code;
            record.last_exit_signal = signal;
        }

        let should_restart = match self.spec.restart_policy {
            RestartPolicy::Never => false,
            RestartPolicy::OnFailure => is_failure,
            RestartPolicy::Always => true,
        };

        if !should_restart {
            if is_failure {
                self.mark_failed("process exited").await;
            } else {
                self.set_status(ProcessStatus::Stopped).await;
                self.emit(Event::ProcessStopped { name: self.spec.name.clone() }).await;
            }
            return false;
        }

        let restart_count = self.record.lock().await.restart_count;
        if restart_count >= self.spec.max_retries {
            self.mark_failed("restart budget exhausted").await;
            return false;
        }

        {
            let mut record = self.record.lock().await;
            record.restart_count += 1;
        }
        self.emit(Event::ProcessRestarting { name: self.spec.name.clone(), attempt: restart_count + 1 }).await;

        if !self.spec.restart_delay.is_zero() {
            tokio::time::sleep(self.spec.restart_delay).await;
        }

        self.handle_start().await.is_ok()
    }

    async fn run_hook(&self, command: &str) -> Result<(), HookError> {
        let cwd = self.spec.resolve_cwd(&self.orchestrator_cwd);
        let env = self.spec.merged_env(std::env::vars());
        hooks::run_hook(command, &cwd, &env, procwave_core::DEFAULT_HOOK_TIMEOUT).await
    }

    async fn set_status(&self, status: ProcessStatus) {
        self.record.lock().await.status = status;
    }

    async fn update_build_info(&self, info: BuildInfo) {
        self.record.lock().await.build_info = Some(info.clone());
        self.emit(Event::ProcessBuildUpdate { name: self.spec.name.clone(), info }).await;
    }

    async fn mark_failed(&self, reason: &str) {
        self.set_status(ProcessStatus::Failed).await;
        self.emit(Event::ProcessFailed { name: self.spec.name.clone(), reason: reason.to_string() }).await;
    }

    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
