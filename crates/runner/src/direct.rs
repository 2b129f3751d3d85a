// SPDX-License-Identifier: MIT

//! Direct execution strategy (section 4.3): spawn via `sh -c`, capture
//! stdout/stderr line by line, feed them through the kind-specific
//! [`crate::parser::OutputParser`], and broadcast the resulting events.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use procwave_core::{BuildInfo, LogLevel, ProcessEvent, RunnerKind};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, oneshot};

use crate::error::RunnerError;
use crate::parser::{self, OutputParser};
use crate::{Runner, EVENT_CHANNEL_CAPACITY};

/// Grace period for a `container` kind's stop sequence before force-killing
/// the container (section 4.3: "graceful stop, then force-kill, then remove").
const CONTAINER_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra time granted to the SIGKILL path after escalation, on top of the
/// caller's graceful timeout, before we give up waiting on the reaper.
const KILL_GRACE: Duration = Duration::from_secs(5);

struct ChildState {
    pid: u32,
    build_info: Mutex<Option<BuildInfo>>,
    parser: Mutex<Box<dyn OutputParser>>,
}

/// Spawns and supervises a single child process in-process.
///
/// The child is owned entirely by a reaper task spawned in [`start`], which
/// notifies `exited` the moment `wait()` resolves — whether that's because
/// `stop()` signaled it or because the child exited on its own. This is what
/// lets an unexpected crash surface as a `ProcessEvent::Exit` without anyone
/// having called `stop()` first.
pub struct DirectRunner {
    command: String,
    cwd: PathBuf,
    env: BTreeMap<String, String>,
    kind: RunnerKind,
    events_tx: broadcast::Sender<ProcessEvent>,
    state: Option<Arc<ChildState>>,
    exited: Option<oneshot::Receiver<()>>,
}

impl DirectRunner {
    pub fn new(command: impl Into<String>, cwd: PathBuf, env: BTreeMap<String, String>, kind: RunnerKind) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { command: command.into(), cwd, env, kind, events_tx, state: None, exited: None }
    }

    fn container_id(&self) -> Option<String> {
        let state = self.state.as_ref()?;
        #[allow(clippy::expect_used)]
        state.parser.lock().expect("parser mutex poisoned").container_id().map(str::to_string)
    }

    fn send_signal(pid: u32, signal: nix::sys::signal::Signal) {
        #[allow(clippy::cast_possible_wrap)]
        let pid = nix::unistd::Pid::from_raw(pid as i32);
        let _ = nix::sys::signal::kill(pid, signal);
    }
}

fn spawn_output_pump(
    mut reader: impl tokio::io::AsyncBufRead + Unpin + Send + 'static,
    level: LogLevel,
    state: Arc<ChildState>,
    events_tx: broadcast::Sender<ProcessEvent>,
) {
    tokio::spawn(async move {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = line.trim_end_matches(['\n', '\r']);
                    let _ = events_tx.send(ProcessEvent::Log { level, content: trimmed.to_string() });
                    #[allow(clippy::expect_used)]
                    let events = {
                        let mut parser = state.parser.lock().expect("parser mutex poisoned");
                        parser.on_line(level, trimmed)
                    };
                    for event in events {
                        if let ProcessEvent::BuildProgress { info }
                        | ProcessEvent::BuildComplete { info }
                        | ProcessEvent::BuildFailed { info } = &event
                        {
                            #[allow(clippy::expect_used)]
                            let mut build_info = state.build_info.lock().expect("build info mutex poisoned");
                            *build_info = Some(info.clone());
                        }
                        let _ = events_tx.send(event);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "output pump read error");
                    break;
                }
            }
        }
    });
}

#[async_trait]
impl Runner for DirectRunner {
    async fn start(&mut self) -> Result<(), RunnerError> {
        let mut command = tokio::process::Command::new("sh");
        command
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.cwd)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(RunnerError::Spawn)?;
        let pid = child.id().unwrap_or(0);

        let state = Arc::new(ChildState {
            pid,
            build_info: Mutex::new(None),
            parser: Mutex::new(parser::for_runner_kind(self.kind)),
        });

        if let Some(stdout) = child.stdout.take() {
            spawn_output_pump(BufReader::new(stdout), LogLevel::Stdout, state.clone(), self.events_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_output_pump(BufReader::new(stderr), LogLevel::Stderr, state.clone(), self.events_tx.clone());
        }

        let (exited_tx, exited_rx) = oneshot::channel();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = child.wait().await;
            let (code, signal) = match result {
                Ok(status) => {
                    #[cfg(unix)]
                    let signal = std::os::unix::process::ExitStatusExt::signal(&status);
                    #[cfg(not(unix))]
                    let signal = None;
                    (status.code(), signal)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "error waiting for child exit");
                    (None, None)
                }
            };
            let _ = events_tx.send(ProcessEvent::Exit { code, signal });
            let _ = exited_tx.send(());
        });

        if !self.kind.is_build_style() && self.kind != RunnerKind::DevServer {
            let _ = self.events_tx.send(ProcessEvent::Ready);
        }

        self.state = Some(state);
        self.exited = Some(exited_rx);
        Ok(())
    }

    async fn stop(&mut self, graceful_timeout: Duration) -> Result<(), RunnerError> {
        let Some(state) = self.state.take() else {
            return Err(RunnerError::NotRunning);
        };
        let mut exited = self.exited.take().ok_or(RunnerError::NotRunning)?;

        // The child may already have exited on its own (crash, natural
        // completion) before anyone called stop() — the reaper task already
        // reaped it and its pid may since have been recycled by the OS, so
        // signaling again would be unsafe.
        match exited.try_recv() {
            Ok(()) | Err(oneshot::error::TryRecvError::Closed) => return Ok(()),
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        if self.kind == RunnerKind::Container {
            if let Some(container_id) = self.container_id() {
                stop_container(&container_id, CONTAINER_STOP_TIMEOUT).await;
            }
        }

        Self::send_signal(state.pid, nix::sys::signal::Signal::SIGTERM);

        if tokio::time::timeout(graceful_timeout, &mut exited).await.is_err() {
            Self::send_signal(state.pid, nix::sys::signal::Signal::SIGKILL);
            let _ = tokio::time::timeout(KILL_GRACE, &mut exited).await;
        }

        Ok(())
    }

    fn pid(&self) -> Option<u32> {
        self.state.as_ref().map(|s| s.pid)
    }

    fn build_info(&self) -> Option<BuildInfo> {
        let state = self.state.as_ref()?;
        #[allow(clippy::expect_used)]
        state.build_info.lock().expect("build info mutex poisoned").clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<ProcessEvent> {
        self.events_tx.subscribe()
    }
}

/// Graceful `docker stop` (or podman) followed by a forced kill+remove if it
/// doesn't exit within `timeout` (section 4.3 container stop sequence).
/// Tries `docker` first, falling back to `podman` only if `docker` is absent.
async fn stop_container(container_id: &str, timeout: Duration) {
    let binary = if which::which("docker").is_ok() { "docker" } else { "podman" };

    let stop = tokio::process::Command::new(binary)
        .arg("stop")
        .arg("-t")
        .arg(timeout.as_secs().to_string())
        .arg(container_id)
        .output();

    match tokio::time::timeout(timeout + KILL_GRACE, stop).await {
        Ok(Ok(output)) if output.status.success() => {}
        _ => {
            tracing::warn!(container_id, "graceful container stop failed, forcing kill");
            let _ = tokio::process::Command::new(binary).arg("kill").arg(container_id).output().await;
        }
    }
    let _ = tokio::process::Command::new(binary).arg("rm").arg("-f").arg(container_id).output().await;
}

#[cfg(test)]
#[path = "direct_tests.rs"]
mod tests;
