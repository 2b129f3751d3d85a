// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-preflight: startup gating (section 4.2).
//!
//! Runs, in order, the built-in checks, the derived port-availability check,
//! then user-defined checks from the configuration document. Every check
//! carries its own duration; the aggregate [`report::PreflightReport`] is
//! handed back to the orchestrator, which surfaces a single aggregate error
//! naming every failed check and aborts before any child is spawned.

pub mod builtins;
pub mod port;
pub mod report;

use std::time::{Duration, Instant};

use procwave_config::{EngineConfig, PreflightCheckSpec};
use procwave_core::ProcessSpec;

pub use report::{CheckResult, PreflightFailure, PreflightReport};

/// Run every applicable check against `config` and return the full report
/// (section 4.2 contract: "runs all applicable checks sequentially (order:
/// built-ins, then port check, then user checks)").
pub async fn run(config: &EngineConfig) -> PreflightReport {
    let specs: Vec<&ProcessSpec> = config.processes.values().collect();
    let mut results = Vec::new();

    results.push(builtins::multiplexer_present(config.boot.use_multiplexer).await);

    if specs.iter().any(|s| s.runner_kind == procwave_core::RunnerKind::Container) {
        results.push(builtins::container_daemon_reachable().await);
    }

    results.push(port::check_ports(&specs).await);

    for check in &config.preflight_checks {
        results.push(run_user_check(check).await);
    }

    PreflightReport { results }
}

async fn run_user_check(check: &PreflightCheckSpec) -> CheckResult {
    let started = Instant::now();
    let outcome = tokio::time::timeout(check.timeout, run_shell(&check.command)).await;
    let duration = started.elapsed();
    match outcome {
        Ok(Ok(true)) => CheckResult::pass(check.name.clone(), duration),
        Ok(Ok(false)) => CheckResult::fail(
            check.name.clone(),
            check.message.clone().unwrap_or_else(|| format!("check {:?} failed", check.command)),
            check.fix_suggestion.clone(),
            duration,
        ),
        Ok(Err(err)) => CheckResult::fail(
            check.name.clone(),
            format!("failed to run check {:?}: {err}", check.command),
            check.fix_suggestion.clone(),
            duration,
        ),
        Err(_) => CheckResult::fail(
            check.name.clone(),
            format!("check {:?} timed out after {:?}", check.command, check.timeout),
            check.fix_suggestion.clone(),
            duration,
        ),
    }
}

/// Run a one-shot shell command to completion, section 4.3's `sh -c`
/// spawn contract reused for preflight (and, separately, hooks).
pub(crate) async fn run_shell(command: &str) -> std::io::Result<bool> {
    let status = tokio::process::Command::new("sh").arg("-c").arg(command).status().await?;
    Ok(status.success())
}

/// Bounded external-tool invocation shared by the built-in checks: runs
/// `command` with `args`, bounded by `timeout`, and reports success as a
/// zero exit code. Used for `docker info`/`podman info` and `<tool>
/// --version` probes.
pub(crate) async fn run_bounded(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> std::io::Result<bool> {
    let output = tokio::time::timeout(
        timeout,
        tokio::process::Command::new(program).args(args).output(),
    )
    .await;
    match output {
        Ok(Ok(output)) => Ok(output.status.success()),
        Ok(Err(err)) => Err(err),
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
