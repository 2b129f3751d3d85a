use std::time::Duration;

use procwave_core::ProbeOutcome;

use super::*;

#[tokio::test(start_paused = true)]
async fn tcp_refused_connection_times_out() {
    let check = ReadyCheck::Tcp {
        host: "127.0.0.1".to_string(),
        port: 1, // privileged, never bound in test sandboxes
        timeout: Duration::from_millis(50),
        interval: Duration::from_millis(10),
        max_attempts: 3,
    };
    let outcome = probe(&check, None, None).await;
    assert_eq!(outcome, ProbeOutcome::Timeout);
}

#[tokio::test(start_paused = true)]
async fn exit_code_ready_on_zero() {
    let (tx, rx) = broadcast::channel(4);
    let _ = tx.send(ProcessEvent::Exit { code: Some(0), signal: None });
    let check = ReadyCheck::ExitCode { timeout: Duration::from_secs(1) };
    let outcome = probe(&check, Some(rx), None).await;
    assert_eq!(outcome, ProbeOutcome::Ready);
}

#[tokio::test(start_paused = true)]
async fn log_pattern_matches_later_line() {
    let (tx, rx) = broadcast::channel(4);
    let _ = tx.send(ProcessEvent::Log {
        level: procwave_core::LogLevel::Stdout,
        content: "booting...".to_string(),
    });
    let _ = tx.send(ProcessEvent::Log {
        level: procwave_core::LogLevel::Stdout,
        content: "server listening on :3000".to_string(),
    });
    let check =
        ReadyCheck::LogPattern { pattern: "listening on".to_string(), timeout: Duration::from_secs(1) };
    let outcome = probe(&check, Some(rx), None).await;
    assert_eq!(outcome, ProbeOutcome::Ready);
}
