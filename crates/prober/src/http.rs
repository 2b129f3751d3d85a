// SPDX-License-Identifier: MIT

use std::time::Duration;

use procwave_core::ProbeOutcome;

use crate::{poll_until, ProgressSink};

/// `http` readiness: open a connection, issue a request, compare status.
/// Connection refusal counts as not-ready, not a hard failure (section 4.5).
pub(crate) async fn probe(
    url: &str,
    expected_status: u16,
    timeout: Duration,
    interval: Duration,
    max_attempts: u32,
    progress: Option<ProgressSink>,
) -> ProbeOutcome {
    let client = match reqwest::Client::builder().timeout(interval).build() {
        Ok(client) => client,
        Err(_) => return ProbeOutcome::Failed,
    };
    let url = url.to_string();

    poll_until(timeout, interval, max_attempts, progress, || {
        let client = client.clone();
        let url = url.clone();
        async move {
            match client.get(&url).send().await {
                Ok(response) => response.status().as_u16() == expected_status,
                Err(_) => false,
            }
        }
    })
    .await
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
