use std::time::Duration;

use procwave_core::ProbeOutcome;
use tokio::net::TcpListener;

use super::*;

#[tokio::test(start_paused = true)]
async fn connect_succeeds_once_listener_is_bound() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local_addr").port();
    tokio::spawn(async move {
        let _ = listener.accept().await;
    });

    let outcome =
        probe("127.0.0.1", port, Duration::from_secs(1), Duration::from_millis(10), 10, None).await;
    assert_eq!(outcome, ProbeOutcome::Ready);
}

#[tokio::test(start_paused = true)]
async fn refused_connection_exhausts_attempts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local_addr").port();
    drop(listener); // nothing listening now

    let outcome =
        probe("127.0.0.1", port, Duration::from_secs(1), Duration::from_millis(10), 3, None).await;
    assert_eq!(outcome, ProbeOutcome::Timeout);
}
