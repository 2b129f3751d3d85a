// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-prober: readiness probing (section 4.5).
//!
//! Given a [`ReadyCheck`] and, for the two variants that need to observe a
//! running child (`exit-code`, `log-pattern`), a subscription to that
//! process's event stream, `probe` drives the check to one of
//! [`ProbeOutcome::Ready`], [`ProbeOutcome::Timeout`], or
//! [`ProbeOutcome::Failed`]. Both `max_attempts` and `timeout` are
//! enforced; whichever fires first ends the loop.

mod custom;
mod exit_code;
mod http;
mod log_pattern;
mod tcp;

use std::time::Duration;

use procwave_core::{ProcessEvent, ReadyCheck, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS};
pub use procwave_core::ProbeOutcome;
use tokio::sync::broadcast;

/// Per-attempt progress, consumed by the supervisor for status/logging
/// (section 4.5: "emits per-attempt progress events consumed by status and
/// logging").
#[derive(Debug, Clone, Copy)]
pub struct ProbeAttempt {
    pub attempt: u32,
    pub elapsed: Duration,
}

/// Optional sink for [`ProbeAttempt`] events. A probe that doesn't loop
/// (`exit-code`) never emits one.
pub type ProgressSink = tokio::sync::mpsc::UnboundedSender<ProbeAttempt>;

/// The subset of a running process's event stream a prober may need:
/// `exit-code` waits for [`ProcessEvent::Exit`], `log-pattern` scans
/// [`ProcessEvent::Log`]. Other variants never touch it.
pub type EventStream = broadcast::Receiver<ProcessEvent>;

/// Drive `check` to a terminal outcome.
///
/// `events` is required for `exit-code` and `log-pattern`; passing `None`
/// for those variants is a programmer error the caller should have
/// prevented at configuration time (`log-pattern` is additionally rejected
/// under the Pane strategy by `procwave-config`).
pub async fn probe(
    check: &ReadyCheck,
    events: Option<EventStream>,
    progress: Option<ProgressSink>,
) -> ProbeOutcome {
    match check {
        ReadyCheck::Http { url, expected_status, timeout, interval, max_attempts } => {
            http::probe(url, *expected_status, *timeout, *interval, *max_attempts, progress).await
        }
        ReadyCheck::Tcp { host, port, timeout, interval, max_attempts } => {
            tcp::probe(host, *port, *timeout, *interval, *max_attempts, progress).await
        }
        ReadyCheck::ExitCode { timeout } => {
            #[allow(clippy::expect_used)]
            let events = events.expect("exit-code probe requires an event stream");
            exit_code::probe(events, *timeout).await
        }
        ReadyCheck::LogPattern { pattern, timeout } => {
            #[allow(clippy::expect_used)]
            let events = events.expect("log-pattern probe requires an event stream");
            log_pattern::probe(pattern, events, *timeout).await
        }
        ReadyCheck::Custom { command, timeout, interval, max_attempts } => {
            custom::probe(command, *timeout, *interval, *max_attempts, progress).await
        }
    }
}

/// Shared attempt-loop scaffolding used by the polling variants (http, tcp,
/// custom): at most `max_attempts` iterations spaced `interval` apart,
/// bounded overall by `timeout`, whichever fires first (section 4.5).
async fn poll_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    max_attempts: u32,
    progress: Option<ProgressSink>,
    mut attempt_fn: F,
) -> ProbeOutcome
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let started = tokio::time::Instant::now();
    let deadline = started + timeout;
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if tokio::time::Instant::now() >= deadline {
            return ProbeOutcome::Timeout;
        }

        if attempt_fn().await {
            return ProbeOutcome::Ready;
        }

        if let Some(sink) = &progress {
            let _ = sink.send(ProbeAttempt { attempt, elapsed: started.elapsed() });
        }

        if attempt == max_attempts {
            return ProbeOutcome::Timeout;
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return ProbeOutcome::Timeout;
        }
        tokio::time::sleep(interval.min(remaining)).await;
    }

    ProbeOutcome::Timeout
}

/// Defaults applied by callers constructing a [`ReadyCheck`] programmatically
/// (e.g. tests); configuration loading applies the same defaults via serde.
pub const fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}
pub const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
