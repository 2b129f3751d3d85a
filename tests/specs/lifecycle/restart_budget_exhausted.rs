//! Scenario 4 (section 8): an `on-failure` process that exits non-zero
//! immediately restarts up to `maxRetries`, then gives up for good. The
//! fleet itself stays up — this failure happens after readiness (no probe
//! configured means `running` is asserted on spawn), so it never cascades.

use crate::support::{run, RunningEngine, TestProject};

fn config() -> &'static str {
    r#"
project = "restart-exhausted"

[boot]
use_multiplexer = false
status_tick_interval = "30ms"

[processes.w]
command = "false"
restart_policy = "on-failure"
restart_delay = "10ms"
max_retries = 3
"#
}

#[test]
fn restart_count_stops_at_max_retries_then_failed_is_terminal() {
    let project = TestProject::new();
    project.write_config(config());

    let engine = RunningEngine::spawn(&project);

    // Poll status until `w` reaches its terminal `failed` state with
    // restart_count pinned at max_retries, or give up after a generous
    // number of attempts (restart_delay=10ms means this should settle
    // within a couple hundred milliseconds).
    let mut last = serde_json::Value::Null;
    let mut observed_failed = false;
    for _ in 0..100 {
        let status = run(&project, &["status"]);
        assert!(status.status.success());
        let value: serde_json::Value = serde_json::from_str(&status.stdout).expect("valid JSON");
        let w = value["processes"]
            .as_array()
            .expect("processes array")
            .iter()
            .find(|p| p["name"] == "w")
            .expect("w is tracked")
            .clone();
        if w["status"] == "failed" {
            assert_eq!(w["restart_count"], 3, "restart_count must equal max_retries when exhausted");
            observed_failed = true;
            last = w;
            break;
        }
        last = w;
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    assert!(observed_failed, "w should reach terminal failed within the poll budget, last seen: {last}");

    engine.stop();
}
