// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the CLI binary (section 6:
//! "`--socket <path>` defaults under `$XDG_STATE_HOME/procwave` /
//! `~/.local/state/procwave`, mirroring the teacher's `env.rs` resolution
//! order").

use std::path::PathBuf;

/// Resolve the state directory: `PROCWAVE_STATE_DIR` > `XDG_STATE_HOME/procwave`
/// > `~/.local/state/procwave`.
pub fn state_dir() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("PROCWAVE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("procwave"));
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;
    Ok(home.join(".local/state/procwave"))
}

/// Default control socket path, scoped to the current working directory's
/// basename so more than one project can run under the same state dir
/// without colliding (the engine itself is single-instance per
/// configuration, but a user's shell can cd between several).
pub fn default_socket_path(project: &str) -> anyhow::Result<PathBuf> {
    Ok(state_dir()?.join(format!("{project}.sock")))
}

/// Log file path, only used when `PROCWAVE_LOG_FILE` is set.
pub fn log_file_override() -> Option<PathBuf> {
    std::env::var("PROCWAVE_LOG_FILE").ok().map(PathBuf::from)
}
