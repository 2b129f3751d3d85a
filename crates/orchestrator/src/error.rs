// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors `start()` can surface as its return value (section 7: "The
/// orchestrator surfaces the first terminal failure of a startup phase as
/// the return value of `start()`").
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Resolve(#[from] procwave_resolver::ResolveError),

    #[error(transparent)]
    Preflight(#[from] procwave_preflight::PreflightFailure),

    #[error("global pre_start_all hook failed: {0}")]
    GlobalPreStartHook(String),

    #[error("global post_stop_all hook failed: {0}")]
    GlobalPostStopHook(String),

    #[error("multiplexer session setup failed: {0}")]
    Multiplexer(#[from] procwave_runner::multiplexer::MultiplexerError),

    #[error("failed to bind control socket: {0}")]
    Broadcast(#[from] procwave_broadcast::BroadcastError),

    #[error("process {0:?} reached failed state before fleet readiness: {1}")]
    ProcessFailedBeforeReady(String, String),

    #[error("no such process {0:?}")]
    UnknownProcess(String),

    #[error("orchestrator is not running")]
    NotRunning,

    #[error("orchestrator is already running")]
    AlreadyRunning,
}
