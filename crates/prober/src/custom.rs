// SPDX-License-Identifier: MIT

use std::time::Duration;

use procwave_core::ProbeOutcome;
use tokio::process::Command;

use crate::{poll_until, ProgressSink};

/// `custom` readiness: execute the probe command at each interval; ready
/// on exit code 0 (section 4.5).
pub(crate) async fn probe(
    command: &str,
    timeout: Duration,
    interval: Duration,
    max_attempts: u32,
    progress: Option<ProgressSink>,
) -> ProbeOutcome {
    let command = command.to_string();

    poll_until(timeout, interval, max_attempts, progress, || {
        let command = command.clone();
        async move {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&command).kill_on_drop(true);
            match tokio::time::timeout(interval, cmd.status()).await {
                Ok(Ok(status)) => status.success(),
                _ => false,
            }
        }
    })
    .await
}

#[cfg(test)]
#[path = "custom_tests.rs"]
mod tests;
