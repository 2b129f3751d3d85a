// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-orchestrator: composes the resolver, preflight runner, process
//! runners, lifecycle supervisors, status aggregator, and broadcast server
//! into the engine's top-level operations (section 4.8).
//!
//! One [`Orchestrator`] owns the full [`procwave_core::ProcessRecord`]
//! collection and every other long-lived task (supervisors, the status
//! aggregator, the broadcast server); those tasks only exist between a
//! `start()` that succeeds and the `stop()` that tears them back down
//! (section 5: "the orchestrator, the status aggregator, and the broadcast
//! server each run as independent tasks").

pub mod error;
mod handler;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use procwave_broadcast::{BroadcastServer, WireMessage};
use procwave_config::EngineConfig;
use procwave_core::{
    Clock, Event, ExecutionStrategy, ProcessRecord, ProcessSpec, StatusSnapshot, SystemClock,
    Waves,
};
use procwave_runner::direct::DirectRunner;
use procwave_runner::multiplexer::{MultiplexerDriver, NoopMultiplexer, TmuxDriver};
use procwave_runner::pane::PaneRunner;
use procwave_runner::Runner;
use procwave_status::Aggregator;
use procwave_supervisor::{Command as SupervisorCommand, RecordHandle, Supervisor, SupervisorHandle};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;

pub use error::OrchestratorError;
pub use handler::OrchestratorCommandHandler;

/// Depth of the channels carrying [`Event`]s from every supervisor into the
/// orchestrator's fan-out task. Generous enough to absorb a burst across an
/// entire wave's worth of processes without a supervisor blocking on send.
const EVENT_CHANNEL_DEPTH: usize = 512;

/// Everything that exists only between a successful `start()` and the
/// matching `stop()`.
struct RunState {
    cancel: CancellationToken,
    supervisors: BTreeMap<String, SupervisorHandle>,
    /// Internal event fan-out, subscribed fresh by every `await_wave` call
    /// so a late subscriber never misses the events it's waiting for
    /// (subscribed before any command that could produce them is sent).
    fanout_tx: broadcast::Sender<Event>,
    events_tx: mpsc::Sender<Event>,
    /// Names that have reached `running` since this run started, in the
    /// order they did so — the reverse of this is teardown order (section
    /// 5: "Shutdown visits processes in reverse of start order").
    started_order: Vec<String>,
    service_tasks: Vec<tokio::task::JoinHandle<()>>,
}

/// The top-level engine: owns the process record collection and drives
/// `start`/`stop`/`restart`/`getStatus`/`getSnapshot`/`attach` (section 4.8).
pub struct Orchestrator {
    config: EngineConfig,
    cwd: PathBuf,
    socket_path: PathBuf,
    multiplexer: Arc<dyn MultiplexerDriver>,
    records: BTreeMap<String, RecordHandle>,
    waves: Waves,
    topo_order: Vec<String>,
    latest_snapshot: Mutex<Option<Arc<StatusSnapshot>>>,
    state: Mutex<Option<RunState>>,
}

impl Orchestrator {
    /// Build an orchestrator for `config`, choosing the multiplexer driver
    /// from `config.boot.use_multiplexer` (tmux when enabled, the no-op
    /// fallback otherwise — section 9: "every feature except pane
    /// visibility and attach must work with [the no-op]").
    pub fn new(
        config: EngineConfig,
        cwd: PathBuf,
        socket_path: PathBuf,
    ) -> Result<Arc<Self>, OrchestratorError> {
        let multiplexer: Arc<dyn MultiplexerDriver> = if config.boot.use_multiplexer {
            Arc::new(TmuxDriver::new(config.project.clone()))
        } else {
            Arc::new(NoopMultiplexer)
        };
        Self::new_with_multiplexer(config, cwd, socket_path, multiplexer)
    }

    /// As [`Self::new`], but with an explicit multiplexer driver — the seam
    /// tests use to inject a driver that never shells out.
    pub fn new_with_multiplexer(
        config: EngineConfig,
        cwd: PathBuf,
        socket_path: PathBuf,
        multiplexer: Arc<dyn MultiplexerDriver>,
    ) -> Result<Arc<Self>, OrchestratorError> {
        let specs: Vec<ProcessSpec> = config.processes.values().cloned().collect();
        let waves = procwave_resolver::into_waves(&specs)?;
        let topo_order = procwave_resolver::topological_order(&specs)?;

        let records = config
            .processes
            .keys()
            .map(|name| (name.clone(), Arc::new(Mutex::new(ProcessRecord::new(name)))))
            .collect();

        Ok(Arc::new(Self {
            config,
            cwd,
            socket_path,
            multiplexer,
            records,
            waves,
            topo_order,
            latest_snapshot: Mutex::new(None),
            state: Mutex::new(None),
        }))
    }

    pub fn project(&self) -> &str {
        &self.config.project
    }

    pub fn waves(&self) -> &Waves {
        &self.waves
    }

    /// Run preflight, stand up the aggregator and broadcast server on first
    /// call, and start every process named in `names` (default: all),
    /// wave by wave. A terminal failure before a wave's processes all
    /// reach `running` triggers cascade teardown of everything started so
    /// far this run and tears the whole engine back down before returning
    /// (section 4.8).
    pub async fn start(
        self: &Arc<Self>,
        names: Option<&[String]>,
    ) -> Result<(), OrchestratorError> {
        let target = self.target_names(names);
        let graceful_timeout = self.config.boot.graceful_stop_timeout;

        let mut guard = self.state.lock().await;

        if guard.is_none() {
            let report = procwave_preflight::run(&self.config).await;
            report.into_result()?;

            if self.config.boot.use_multiplexer {
                self.multiplexer
                    .create_session(&self.config.project)
                    .await?;
                for category in self.categories_for(&target) {
                    self.multiplexer.create_window(&category).await?;
                }
            }

            if let Some(cmd) = self.config.global_hooks.pre_start.clone() {
                let env: BTreeMap<String, String> = std::env::vars().collect();
                procwave_supervisor::hooks::run_hook(
                    &cmd,
                    &self.cwd,
                    &env,
                    procwave_core::DEFAULT_HOOK_TIMEOUT,
                )
                .await
                .map_err(|e| OrchestratorError::GlobalPreStartHook(e.to_string()))?;
            }

            *guard = Some(self.spin_up_services().await?);
        }

        #[allow(clippy::expect_used)]
        let state = guard.as_mut().expect("initialized above");
        let events_tx = state.events_tx.clone();
        let cancel = state.cancel.clone();
        let mut fanout_rx = state.fanout_tx.subscribe();

        let filtered = self.filter_waves(&target);
        for wave in filtered.iter() {
            if wave.is_empty() {
                continue;
            }

            for name in wave {
                if let Some(handle) = state.supervisors.get(name) {
                    let _ = handle.commands.send(SupervisorCommand::Start).await;
                } else {
                    let spec = Arc::new(self.config.processes[name].clone());
                    let record = self.records[name].clone();
                    let runner = self.build_runner(&spec);
                    let supervisor = Supervisor::new(
                        spec,
                        runner,
                        record,
                        SystemClock,
                        self.cwd.clone(),
                        events_tx.clone(),
                        cancel.clone(),
                    );
                    let handle = procwave_supervisor::spawn(supervisor);
                    let _ = handle.commands.send(SupervisorCommand::Start).await;
                    state.supervisors.insert(name.clone(), handle);
                }
            }

            let (ready_names, failure) = await_wave(wave, &mut fanout_rx).await;
            state.started_order.extend(ready_names);

            if let Some((name, reason)) = failure {
                let reverse: Vec<String> = state.started_order.iter().rev().cloned().collect();
                teardown_processes(state, &reverse, graceful_timeout).await;
                #[allow(clippy::expect_used)]
                let state_owned = guard.take().expect("state present");
                self.shutdown_services(state_owned).await;
                return Err(OrchestratorError::ProcessFailedBeforeReady(name, reason));
            }
        }

        Ok(())
    }

    /// Stop the named processes (default: all) in reverse dependency order.
    /// Stopping every process also tears the aggregator, broadcast server,
    /// and multiplexer session down and unlinks the socket file (section
    /// 4.8); stopping a subset leaves the engine running for the rest.
    pub async fn stop(self: &Arc<Self>, names: Option<&[String]>) -> Result<(), OrchestratorError> {
        let target = self.target_names(names);
        let full_stop = names.is_none();
        let graceful_timeout = self.config.boot.graceful_stop_timeout;

        let mut guard = self.state.lock().await;
        {
            let state = guard.as_ref().ok_or(OrchestratorError::NotRunning)?;
            let reverse_order: Vec<String> = self
                .topo_order
                .iter()
                .rev()
                .filter(|n| target.contains(n.as_str()))
                .cloned()
                .collect();
            teardown_processes(state, &reverse_order, graceful_timeout).await;
        }

        if full_stop {
            if let Some(state) = guard.take() {
                self.shutdown_services(state).await;
            }
        }

        Ok(())
    }

    /// Stop then start each named process. Per the resolved open question,
    /// a manual restart does not increment `restartCount` — that counter
    /// is reserved for restarts the restart-policy table itself drives.
    pub async fn restart(self: &Arc<Self>, names: &[String]) -> Result<(), OrchestratorError> {
        let graceful_timeout = self.config.boot.graceful_stop_timeout;
        let mut guard = self.state.lock().await;
        let state = guard.as_mut().ok_or(OrchestratorError::NotRunning)?;
        let mut fanout_rx = state.fanout_tx.subscribe();

        for name in names {
            let handle = state
                .supervisors
                .get(name)
                .ok_or_else(|| OrchestratorError::UnknownProcess(name.clone()))?;
            handle
                .commands
                .send(SupervisorCommand::Restart { graceful_timeout })
                .await
                .map_err(|_| OrchestratorError::UnknownProcess(name.clone()))?;
        }

        let (_ready, failure) = await_wave(names, &mut fanout_rx).await;
        match failure {
            Some((name, reason)) => Err(OrchestratorError::ProcessFailedBeforeReady(name, reason)),
            None => Ok(()),
        }
    }

    /// A read-only snapshot of one process's current record, if it's part
    /// of this orchestrator's configuration.
    pub async fn get_status(&self, name: &str) -> Option<ProcessRecord> {
        let handle = self.records.get(name)?;
        Some(handle.lock().await.clone())
    }

    /// The most recently published status snapshot, if the aggregator has
    /// published at least one since `start()`.
    pub async fn get_snapshot(&self) -> Option<Arc<StatusSnapshot>> {
        self.latest_snapshot.lock().await.clone()
    }

    /// Hand a TTY off to the multiplexer session (section 4.8). A no-op
    /// under [`NoopMultiplexer`].
    pub async fn attach(&self) -> Result<(), OrchestratorError> {
        self.multiplexer.attach().await?;
        Ok(())
    }

    /// Spawn the aggregator, the broadcast server, and the internal event
    /// fan-out task that bridges supervisor events into both. Called once,
    /// the first time `start()` succeeds past preflight.
    async fn spin_up_services(self: &Arc<Self>) -> Result<RunState, OrchestratorError> {
        let cancel = CancellationToken::new();
        let (events_tx, mut events_rx) = mpsc::channel::<Event>(EVENT_CHANNEL_DEPTH);
        let (fanout_tx, _) = broadcast::channel::<Event>(EVENT_CHANNEL_DEPTH);

        let server = BroadcastServer::bind(self.socket_path.clone())?;
        let broadcast_tx = server.sender();

        let (aggregator, mut snapshot_rx) = Aggregator::new(
            self.records.clone(),
            SystemClock,
            self.config.boot.status_tick_interval,
        );
        let (agg_events_tx, agg_events_rx) = mpsc::channel::<Event>(EVENT_CHANNEL_DEPTH);

        let mut service_tasks = Vec::new();

        {
            let fanout_tx = fanout_tx.clone();
            let broadcast_tx = broadcast_tx.clone();
            service_tasks.push(tokio::spawn(async move {
                while let Some(event) = events_rx.recv().await {
                    let _ = fanout_tx.send(event.clone());
                    if let Event::ProcessLog { name, level, content } = &event {
                        let msg = WireMessage::Log {
                            process_name: name.clone(),
                            timestamp: SystemClock.epoch_ms(),
                            level: *level,
                            content: content.clone(),
                        };
                        let _ = broadcast_tx.send(msg);
                    }
                    if agg_events_tx.send(event).await.is_err() {
                        break;
                    }
                }
            }));
        }

        service_tasks.push(tokio::spawn(aggregator.run(agg_events_rx, cancel.clone())));

        {
            let broadcast_tx = broadcast_tx.clone();
            let this = Arc::clone(self);
            service_tasks.push(tokio::spawn(async move {
                loop {
                    match snapshot_rx.recv().await {
                        Ok(snapshot) => {
                            *this.latest_snapshot.lock().await = Some(snapshot.clone());
                            let processes = snapshot.processes.values().cloned().collect();
                            let msg = WireMessage::StatusUpdate {
                                timestamp: snapshot.timestamp,
                                processes,
                                system_metrics: None,
                            };
                            let _ = broadcast_tx.send(msg);
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }));
        }

        {
            let handler = Arc::new(OrchestratorCommandHandler::new(Arc::clone(self)));
            service_tasks.push(tokio::spawn(server.run(handler, cancel.clone())));
        }

        Ok(RunState {
            cancel,
            supervisors: BTreeMap::new(),
            fanout_tx,
            events_tx,
            started_order: Vec::new(),
            service_tasks,
        })
    }

    /// Cancel every service task, wait for them to unwind (the broadcast
    /// server unlinks its own socket file as part of this), then run the
    /// `post_stop_all` global hook once and kill the multiplexer session
    /// (section 9: global hooks run once outside all per-process waves).
    async fn shutdown_services(&self, mut state: RunState) {
        state.cancel.cancel();
        for task in state.service_tasks.drain(..) {
            let _ = task.await;
        }

        if let Some(cmd) = self.config.global_hooks.post_stop.clone() {
            let env: BTreeMap<String, String> = std::env::vars().collect();
            if let Err(err) =
                procwave_supervisor::hooks::run_hook(&cmd, &self.cwd, &env, procwave_core::DEFAULT_HOOK_TIMEOUT)
                    .await
            {
                tracing::warn!(error = %err, "post_stop_all hook failed (non-fatal)");
            }
        }

        let _ = self.multiplexer.kill_session().await;
    }

    fn target_names(&self, names: Option<&[String]>) -> BTreeSet<String> {
        match names {
            Some(names) => names.iter().cloned().collect(),
            None => self.config.processes.keys().cloned().collect(),
        }
    }

    fn filter_waves(&self, target: &BTreeSet<String>) -> Waves {
        Waves(
            self.waves
                .iter()
                .map(|wave| wave.iter().filter(|n| target.contains(n.as_str())).cloned().collect())
                .collect(),
        )
    }

    fn categories_for(&self, target: &BTreeSet<String>) -> BTreeSet<String> {
        target
            .iter()
            .filter_map(|name| self.config.processes.get(name))
            .map(|spec| spec.category.clone())
            .collect()
    }

    fn build_runner(&self, spec: &Arc<ProcessSpec>) -> Box<dyn Runner> {
        let cwd = spec.resolve_cwd(&self.cwd);
        let env = spec.merged_env(std::env::vars());
        match spec.strategy {
            ExecutionStrategy::Direct => {
                Box::new(DirectRunner::new(spec.command.clone(), cwd, env, spec.runner_kind))
            }
            ExecutionStrategy::Pane => Box::new(PaneRunner::new(
                self.multiplexer.clone(),
                spec.category.clone(),
                spec.name.clone(),
                spec.command.clone(),
                cwd,
            )),
        }
    }
}

/// Send `Stop` to every named supervisor, in the order given (callers pass
/// already-reversed dependency order).
async fn teardown_processes(state: &RunState, names_in_order: &[String], graceful_timeout: Duration) {
    for name in names_in_order {
        if let Some(handle) = state.supervisors.get(name) {
            let _ = handle
                .commands
                .send(SupervisorCommand::Stop { graceful_timeout })
                .await;
        }
    }
}

/// Wait for every name in `names` to report either `ProcessReady` or
/// `ProcessFailed`. Returns the names that became ready (in arrival order)
/// and the first failure observed, if any — both are needed by the caller
/// to know exactly what to tear down on cascade.
async fn await_wave(
    names: &[String],
    fanout_rx: &mut broadcast::Receiver<Event>,
) -> (Vec<String>, Option<(String, String)>) {
    let mut pending: BTreeSet<String> = names.iter().cloned().collect();
    let mut ready = Vec::new();
    let mut failure = None;

    while !pending.is_empty() {
        match fanout_rx.recv().await {
            Ok(Event::ProcessReady { name }) => {
                if pending.remove(&name) {
                    ready.push(name);
                }
            }
            Ok(Event::ProcessFailed { name, reason }) => {
                if pending.remove(&name) && failure.is_none() {
                    failure = Some((name, reason));
                }
            }
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    (ready, failure)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
