// SPDX-License-Identifier: MIT

//! Built-in preflight checks (section 4.2 supplement): multiplexer binary
//! present, container daemon reachable, runtime version floor. Port
//! availability lives in [`crate::port`] since it needs every spec, not a
//! single fixed command.

use std::time::{Duration, Instant};

use crate::report::CheckResult;

const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// `which`/`PATH` scan for the multiplexer binary (section 4.2: "presence of
/// the multiplexer binary"). Skipped (reported as passing) when the boot
/// options disable multiplexer use entirely.
pub async fn multiplexer_present(use_multiplexer: bool) -> CheckResult {
    let started = Instant::now();
    if !use_multiplexer {
        return CheckResult::pass("multiplexer-binary-present", started.elapsed());
    }
    match which::which("tmux") {
        Ok(_) => CheckResult::pass("multiplexer-binary-present", started.elapsed()),
        Err(_) => CheckResult::fail(
            "multiplexer-binary-present",
            "tmux not found on PATH",
            Some("install tmux, or disable boot.use_multiplexer".to_string()),
            started.elapsed(),
        ),
    }
}

/// Container daemon reachability, gated on any spec using `runnerKind ==
/// container` (section 4.2: "container daemon reachability when containers
/// are used"). Tries `docker info`, falling back to `podman info`.
pub async fn container_daemon_reachable() -> CheckResult {
    let started = Instant::now();
    let docker_ok = crate::run_bounded("docker", &["info"], DEFAULT_CHECK_TIMEOUT).await;
    if matches!(docker_ok, Ok(true)) {
        return CheckResult::pass("container-daemon-reachable", started.elapsed());
    }
    let podman_ok = crate::run_bounded("podman", &["info"], DEFAULT_CHECK_TIMEOUT).await;
    if matches!(podman_ok, Ok(true)) {
        return CheckResult::pass("container-daemon-reachable", started.elapsed());
    }
    CheckResult::fail(
        "container-daemon-reachable",
        "neither `docker info` nor `podman info` succeeded",
        Some("start the container daemon (dockerd/podman)".to_string()),
        started.elapsed(),
    )
}

/// Runtime-version-floor: executes `<tool> --version` and checks it
/// succeeds and parses a semver-ish prefix at or above `floor`. `tool` and
/// `floor` are supplied by the caller (the engine's own invariants don't
/// name a concrete tool; this is exercised by the orchestrator only for
/// tools a configuration document actually names in a preflight check, and
/// directly by tests).
pub async fn runtime_version_floor(tool: &str, floor: (u64, u64, u64)) -> CheckResult {
    let started = Instant::now();
    let output =
        tokio::time::timeout(DEFAULT_CHECK_TIMEOUT, tokio::process::Command::new(tool).arg("--version").output())
            .await;
    let output = match output {
        Ok(Ok(output)) if output.status.success() => output,
        Ok(Ok(_)) | Ok(Err(_)) | Err(_) => {
            return CheckResult::fail(
                "runtime-version-floor",
                format!("`{tool} --version` did not succeed"),
                Some(format!("install {tool} >= {}.{}.{}", floor.0, floor.1, floor.2)),
                started.elapsed(),
            );
        }
    };
    let text = String::from_utf8_lossy(&output.stdout);
    match parse_semver_prefix(&text) {
        Some(found) if found >= floor => CheckResult::pass("runtime-version-floor", started.elapsed()),
        Some(found) => CheckResult::fail(
            "runtime-version-floor",
            format!(
                "{tool} {}.{}.{} is below the required {}.{}.{}",
                found.0, found.1, found.2, floor.0, floor.1, floor.2
            ),
            Some(format!("upgrade {tool} to >= {}.{}.{}", floor.0, floor.1, floor.2)),
            started.elapsed(),
        ),
        None => CheckResult::fail(
            "runtime-version-floor",
            format!("could not parse a version number out of `{tool} --version` output"),
            None,
            started.elapsed(),
        ),
    }
}

/// Pull the first `N.N.N`-shaped substring out of version-command output.
fn parse_semver_prefix(text: &str) -> Option<(u64, u64, u64)> {
    for token in text.split(|c: char| !c.is_ascii_digit() && c != '.') {
        let parts: Vec<&str> = token.split('.').filter(|p| !p.is_empty()).collect();
        if parts.len() >= 2 {
            let major = parts[0].parse().ok()?;
            let minor = parts[1].parse().ok()?;
            let patch = parts.get(2).and_then(|p| p.parse().ok()).unwrap_or(0);
            return Some((major, minor, patch));
        }
    }
    None
}

#[cfg(test)]
#[path = "builtins_tests.rs"]
mod tests;
