use std::time::Duration;

use procwave_core::{LogLevel, ProbeOutcome};
use tokio::sync::broadcast;

use super::*;

#[yare::parameterized(
    one          = { Some(1) },
    two          = { Some(2) },
    general_fail = { Some(127) },
    signal_death = { None },
)]
fn nonzero_exit_is_failed(code: Option<i32>) {
    tokio::runtime::Builder::new_current_thread().enable_time().start_paused(true).build().unwrap().block_on(async {
        let (tx, rx) = broadcast::channel(4);
        let _ = tx.send(ProcessEvent::Exit { code, signal: None });
        let outcome = probe(rx, Duration::from_secs(1)).await;
        assert_eq!(outcome, ProbeOutcome::Failed);
    });
}

#[tokio::test(start_paused = true)]
async fn no_exit_before_timeout() {
    let (tx, rx) = broadcast::channel(4);
    let _ = tx.send(ProcessEvent::Log { level: LogLevel::Stdout, content: "still going".to_string() });
    let outcome = probe(rx, Duration::from_millis(50)).await;
    assert_eq!(outcome, ProbeOutcome::Timeout);
}
