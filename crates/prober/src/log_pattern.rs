// SPDX-License-Identifier: MIT

use std::time::Duration;

use procwave_core::{ProbeOutcome, ProcessEvent};
use regex::Regex;

use crate::EventStream;

/// `log-pattern` readiness: subscribe to the child's stdout/stderr lines;
/// ready on first regex match (section 4.5). Direct strategy only — the
/// Pane strategy has no event stream to subscribe to, and `procwave-config`
/// rejects this combination at load time.
pub(crate) async fn probe(pattern: &str, mut events: EventStream, timeout: Duration) -> ProbeOutcome {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_) => return ProbeOutcome::Failed,
    };

    let wait = async {
        loop {
            match events.recv().await {
                Ok(ProcessEvent::Log { content, .. }) if regex.is_match(&content) => {
                    return ProbeOutcome::Ready;
                }
                Ok(ProcessEvent::Exit { .. }) => return ProbeOutcome::Failed,
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return ProbeOutcome::Failed,
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(outcome) => outcome,
        Err(_) => ProbeOutcome::Timeout,
    }
}

#[cfg(test)]
#[path = "log_pattern_tests.rs"]
mod tests;
