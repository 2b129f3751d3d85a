//! Scenario 1 (section 8), end to end through the compiled binary: two
//! waves (`db`, then `api` depending on it) both reach `running`, and a
//! clean shutdown exits 0 and removes the control socket.

use crate::support::{run, RunningEngine, TestProject};

fn config() -> &'static str {
    r#"
project = "happy-path"

[boot]
use_multiplexer = false
status_tick_interval = "50ms"

[processes.db]
command = "sleep 30"

[processes.api]
command = "sleep 30"
dependencies = ["db"]
"#
}

#[test]
fn both_waves_reach_running_then_shut_down_cleanly() {
    let project = TestProject::new();
    project.write_config(config());

    let engine = RunningEngine::spawn(&project);

    let status = run(&project, &["status"]);
    assert!(status.status.success(), "status query should succeed: {}", status.stderr);

    let value: serde_json::Value =
        serde_json::from_str(&status.stdout).expect("status prints a JSON snapshot");
    let processes = value["processes"].as_array().expect("processes array");
    assert_eq!(processes.len(), 2);
    let statuses: Vec<&str> = processes.iter().map(|p| p["status"].as_str().unwrap_or("?")).collect();
    similar_asserts::assert_eq!(statuses, vec!["running", "running"]);

    let exit_status = engine.stop();
    assert!(exit_status.success(), "clean shutdown exits 0");
    assert!(!project.socket_path().exists(), "socket file is removed on clean shutdown");
}
