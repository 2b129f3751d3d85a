// SPDX-License-Identifier: MIT

use std::time::Duration;

use procwave_core::ProbeOutcome;
use tokio::net::TcpStream;

use crate::{poll_until, ProgressSink};

/// `tcp` readiness: attempt a connection at each interval; ready on
/// connect, not-ready on refusal (section 4.5).
pub(crate) async fn probe(
    host: &str,
    port: u16,
    timeout: Duration,
    interval: Duration,
    max_attempts: u32,
    progress: Option<ProgressSink>,
) -> ProbeOutcome {
    let addr = format!("{host}:{port}");

    poll_until(timeout, interval, max_attempts, progress, || {
        let addr = addr.clone();
        async move { tokio::time::timeout(interval, TcpStream::connect(&addr)).await.is_ok_and(|r| r.is_ok()) }
    })
    .await
}

#[cfg(test)]
#[path = "tcp_tests.rs"]
mod tests;
