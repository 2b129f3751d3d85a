// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Spawn/stop errors (section 7: "Spawn errors: failure to launch a child;
/// treated as the process reaching `failed` state; subject to restart
/// policy").
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn child: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("multiplexer error: {0}")]
    Multiplexer(#[from] crate::multiplexer::MultiplexerError),

    #[error("runner has no child to stop")]
    NotRunning,
}
