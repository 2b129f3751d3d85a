// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while binding the control socket (section 7: "I/O errors
/// on the control socket: per-client fatal (disconnect); never fatal to the
/// server" — this enum only covers bind-time failures, which *are* fatal
/// since nothing can be served without a listening socket).
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to remove stale socket file at {path}: {source}")]
    RemoveStale { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to create parent directory for socket {path}: {source}")]
    CreateDir { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to bind control socket at {path}: {source}")]
    Bind { path: PathBuf, #[source] source: std::io::Error },
}
