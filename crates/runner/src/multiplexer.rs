// SPDX-License-Identifier: MIT

//! The terminal-multiplexer collaborator (section 9: "Multiplexer integration
//! is optional"). Spec treats this as an opaque sink exposing `createSession`,
//! `createWindow`, `createPane`, `sendKeys`, `updateOverview`, `attach`,
//! `killSession` — we ship the trait plus two implementations so Pane
//! strategy is exercisable end to end: [`NoopMultiplexer`] (the mandatory
//! fallback) and [`TmuxDriver`] (grounded on the teacher daemon's
//! `listener/tmux.rs`, generalized from one-shot command invocation to
//! session/window/pane lifecycle management).

use async_trait::async_trait;
use procwave_core::PaneHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MultiplexerError {
    #[error("multiplexer command failed: {0}")]
    CommandFailed(String),
    #[error("multiplexer binary not found on PATH")]
    BinaryMissing,
}

/// The multiplexer capability set the engine depends on (section 1
/// non-goals: "treated as an opaque sink ... The core calls these; their
/// implementation is replaceable").
#[async_trait]
pub trait MultiplexerDriver: Send + Sync {
    async fn create_session(&self, name: &str) -> Result<(), MultiplexerError>;

    async fn create_window(&self, category: &str) -> Result<(), MultiplexerError>;

    async fn create_pane(
        &self,
        category: &str,
        name: &str,
        cmd: &str,
        cwd: Option<&std::path::Path>,
    ) -> Result<PaneHandle, MultiplexerError>;

    async fn send_keys(&self, pane: PaneHandle, keys: &str) -> Result<(), MultiplexerError>;

    async fn update_overview(&self, text: &str) -> Result<(), MultiplexerError>;

    /// Hand off a TTY to the multiplexer session. Documented as a
    /// terminal-replacing operation the engine never awaits the completion
    /// of in the same sense as the other methods; implementations that
    /// can't reasonably support it (the no-op) simply succeed without
    /// doing anything visible.
    async fn attach(&self) -> Result<(), MultiplexerError>;

    async fn kill_session(&self) -> Result<(), MultiplexerError>;
}

/// Mandatory no-op fallback (section 9): every feature except pane
/// visibility and attach must work with this collaborator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMultiplexer;

#[async_trait]
impl MultiplexerDriver for NoopMultiplexer {
    async fn create_session(&self, _name: &str) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn create_window(&self, _category: &str) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn create_pane(
        &self,
        _category: &str,
        _name: &str,
        _cmd: &str,
        _cwd: Option<&std::path::Path>,
    ) -> Result<PaneHandle, MultiplexerError> {
        Ok(PaneHandle::new())
    }

    async fn send_keys(&self, _pane: PaneHandle, _keys: &str) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn update_overview(&self, _text: &str) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn attach(&self) -> Result<(), MultiplexerError> {
        Ok(())
    }

    async fn kill_session(&self) -> Result<(), MultiplexerError> {
        Ok(())
    }
}

/// `tmux`-backed driver. One session per orchestrator run, one window per
/// category, one pane per process.
pub struct TmuxDriver {
    session: String,
}

impl TmuxDriver {
    pub fn new(session: impl Into<String>) -> Self {
        Self { session: session.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, MultiplexerError> {
        tokio::process::Command::new("tmux")
            .args(args)
            .output()
            .await
            .map_err(|e| MultiplexerError::CommandFailed(e.to_string()))
    }
}

#[async_trait]
impl MultiplexerDriver for TmuxDriver {
    async fn create_session(&self, name: &str) -> Result<(), MultiplexerError> {
        let output = self.run(&["new-session", "-d", "-s", &self.session, "-n", name]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(MultiplexerError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }

    async fn create_window(&self, category: &str) -> Result<(), MultiplexerError> {
        let target = format!("{}:", self.session);
        let output = self.run(&["new-window", "-t", &target, "-n", category]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(MultiplexerError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }

    async fn create_pane(
        &self,
        category: &str,
        name: &str,
        cmd: &str,
        cwd: Option<&std::path::Path>,
    ) -> Result<PaneHandle, MultiplexerError> {
        let target = format!("{}:{}", self.session, category);
        let mut args = vec!["split-window", "-t", target.as_str(), "-P", "-F", "#{pane_id}"];
        let cwd_str;
        if let Some(cwd) = cwd {
            cwd_str = cwd.display().to_string();
            args.push("-c");
            args.push(&cwd_str);
        }
        args.push(cmd);

        let output = self.run(&args).await?;
        if !output.status.success() {
            return Err(MultiplexerError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        let pane_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(process = name, pane = %pane_id, "created tmux pane");
        Ok(PaneHandle::from_string(pane_id))
    }

    async fn send_keys(&self, pane: PaneHandle, keys: &str) -> Result<(), MultiplexerError> {
        let output = self.run(&["send-keys", "-t", pane.as_str(), keys, "Enter"]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(MultiplexerError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }

    async fn update_overview(&self, text: &str) -> Result<(), MultiplexerError> {
        // Written to a dedicated status pane (window 0, pane 0) via send-keys,
        // mirroring the session's always-present first window.
        let target = format!("{}:0.0", self.session);
        self.run(&["send-keys", "-t", &target, "clear", "Enter"]).await?;
        for line in text.lines() {
            let escaped = line.replace('\'', "'\\''");
            self.run(&["send-keys", "-t", &target, &format!("echo '{escaped}'"), "Enter"]).await?;
        }
        Ok(())
    }

    async fn attach(&self) -> Result<(), MultiplexerError> {
        // A TTY hand-off: the caller is expected to exec this, not await a
        // background task. We still shell out so the driver's contract is
        // uniform; callers needing a real exec should use `attach_command`.
        let output = self.run(&["attach-session", "-t", &self.session]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(MultiplexerError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }

    async fn kill_session(&self) -> Result<(), MultiplexerError> {
        let output = self.run(&["kill-session", "-t", &self.session]).await?;
        // A missing session is not an error from the orchestrator's
        // perspective — it's already gone.
        if output.status.success() || String::from_utf8_lossy(&output.stderr).contains("session not found")
        {
            Ok(())
        } else {
            Err(MultiplexerError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }
}

#[cfg(test)]
#[path = "multiplexer_tests.rs"]
mod tests;
