use procwave_core::PaneHandle;

use super::*;

#[tokio::test]
async fn noop_multiplexer_satisfies_full_lifecycle() {
    let driver = NoopMultiplexer;
    driver.create_session("demo").await.unwrap();
    driver.create_window("web").await.unwrap();
    let pane = driver.create_pane("web", "api", "true", None).await.unwrap();
    driver.send_keys(pane, "echo hi").await.unwrap();
    driver.update_overview("status text").await.unwrap();
    driver.attach().await.unwrap();
    driver.kill_session().await.unwrap();
}

#[tokio::test]
async fn noop_multiplexer_creates_distinct_pane_handles() {
    let driver = NoopMultiplexer;
    let a = driver.create_pane("web", "a", "true", None).await.unwrap();
    let b = driver.create_pane("web", "b", "true", None).await.unwrap();
    assert_ne!(a, b);
}

#[test]
fn pane_handle_round_trips_through_from_string() {
    let handle = PaneHandle::from_string("%42");
    assert_eq!(handle.as_str(), "%42");
}
