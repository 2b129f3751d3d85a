// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `procwave` — the thin binary that loads a configuration document and
//! drives the engine (section "CLI command dispatch ... out of scope
//! beyond the one `procwave` binary needed to exercise the engine ...
//! deliberately thin").
//!
//! `start` is the one subcommand that owns the engine: it runs in the
//! foreground, blocks on SIGINT/SIGTERM, and tears the engine fully down
//! on either. Every other subcommand is a short-lived client that dials
//! the control socket of an already-running `start` invocation.

mod client;
mod env;
mod logging;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use procwave_broadcast::{CommandAction, WireMessage};
use procwave_orchestrator::Orchestrator;

#[derive(Parser)]
#[command(name = "procwave", version, about = "Local multi-process development orchestrator")]
struct Cli {
    /// Path to the configuration document (TOML).
    #[arg(long, global = true, default_value = "procwave.toml")]
    config: PathBuf,

    /// Path to the control socket. Defaults under the state directory,
    /// named after the configuration's `project`.
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bring the fleet up and run the engine in the foreground until
    /// interrupted.
    Start,
    /// Stop one or more running processes by name.
    Stop { names: Vec<String> },
    /// Restart one or more running processes by name.
    Restart { names: Vec<String> },
    /// Print the most recent status snapshot from a running engine.
    Status,
    /// Hand the terminal off to the multiplexer session (no-op under the
    /// fallback driver).
    Attach,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logging_guard = logging::init();

    let config = procwave_config::load_from_path(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let socket_path = match cli.socket {
        Some(path) => path,
        None => env::default_socket_path(&config.project)?,
    };

    let result = match cli.command {
        Command::Start => start(config, socket_path).await,
        Command::Stop { names } => remote_each(&socket_path, CommandAction::Stop, names).await,
        Command::Restart { names } => remote_each(&socket_path, CommandAction::Restart, names).await,
        Command::Status => status(&socket_path).await,
        Command::Attach => attach(&config.project).await,
    };

    if let Err(err) = &result {
        tracing::error!(error = %err, "command failed");
    }
    result
}

async fn start(config: procwave_config::EngineConfig, socket_path: PathBuf) -> Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let orchestrator = Orchestrator::new(config, cwd, socket_path)
        .map_err(|e| anyhow!("building orchestrator: {e}"))?;

    orchestrator.start(None).await.map_err(|e| anyhow!("{e}"))?;
    tracing::info!("engine up, project {:?}", orchestrator.project());
    println!("procwave: {} is up", orchestrator.project());

    wait_for_shutdown_signal().await?;

    tracing::info!("shutting down");
    orchestrator.stop(None).await.map_err(|e| anyhow!("{e}"))?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
    Ok(())
}

async fn remote_each(socket_path: &std::path::Path, action: CommandAction, names: Vec<String>) -> Result<()> {
    if names.is_empty() {
        return Err(anyhow!("at least one process name is required"));
    }
    for name in names {
        client::send_command(socket_path, action, name).await?;
    }
    Ok(())
}

async fn status(socket_path: &std::path::Path) -> Result<()> {
    match client::fetch_status(socket_path).await? {
        WireMessage::StatusUpdate { timestamp, processes, .. } => {
            let value = serde_json::json!({ "timestamp": timestamp, "processes": processes });
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        other => Err(anyhow!("unexpected reply from engine: {other:?}")),
    }
}

async fn attach(project: &str) -> Result<()> {
    let status = std::process::Command::new("tmux")
        .args(["attach-session", "-t", project])
        .status()
        .context("launching `tmux attach-session` — is tmux installed?")?;
    if !status.success() {
        return Err(anyhow!("tmux attach-session exited with {status}"));
    }
    Ok(())
}
