// SPDX-License-Identifier: MIT

use std::time::Duration;

use procwave_core::{ProbeOutcome, ProcessEvent};

use crate::EventStream;

/// `exit-code` readiness: wait for the child's [`ProcessEvent::Exit`];
/// ready on code 0, failed otherwise (section 4.5). Bounded by `timeout`
/// even though there is no polling interval.
pub(crate) async fn probe(mut events: EventStream, timeout: Duration) -> ProbeOutcome {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(ProcessEvent::Exit { code, .. }) => {
                    return if code == Some(0) { ProbeOutcome::Ready } else { ProbeOutcome::Failed };
                }
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
#[path = "exit_code_tests.rs"]
mod tests;
