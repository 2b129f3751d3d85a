// SPDX-License-Identifier: MIT

//! Lifecycle hooks (section 4.4): `pre_start`/`post_start`/`pre_stop`/
//! `post_stop` shell commands, modeled as a single data value executed
//! through one spawn path — the same `sh -c` contract Direct runners use —
//! rather than scattering `std::process` calls through the state machine.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook command failed to spawn: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("hook exited with status {0}")]
    NonZeroExit(std::process::ExitStatus),

    #[error("hook did not complete within {0:?}")]
    Timeout(Duration),
}

/// Run one hook command to completion, in `cwd`, with `env` merged over the
/// parent environment, bounded by `timeout` (default 60s per spec).
pub async fn run_hook(
    command: &str,
    cwd: &Path,
    env: &BTreeMap<String, String>,
    timeout: Duration,
) -> Result<(), HookError> {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(cwd)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd.spawn().map_err(HookError::Spawn)?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => return Err(HookError::Spawn(err)),
        Err(_) => return Err(HookError::Timeout(timeout)),
    };

    if output.status.success() {
        Ok(())
    } else {
        tracing::debug!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "hook command failed"
        );
        Err(HookError::NonZeroExit(output.status))
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
