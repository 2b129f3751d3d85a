//! Scenario 5 (section 8): a dependency that never becomes ready fails
//! `start()` before its dependent ever spawns, and the engine exits instead
//! of blocking on a signal.

use crate::support::{run, TestProject};

fn config() -> &'static str {
    r#"
project = "cascade"

[boot]
use_multiplexer = false

[processes.db]
command = "true"

[processes.db.ready_check]
kind = "tcp"
host = "127.0.0.1"
port = 59124
timeout = "150ms"
interval = "20ms"
max_attempts = 3

[processes.api]
command = "sleep 30"
dependencies = ["db"]
"#
}

#[test]
fn dependency_failing_readiness_prevents_dependent_spawn_and_exits_nonzero() {
    let project = TestProject::new();
    project.write_config(config());

    let outcome = run(&project, &["start"]);

    assert!(!outcome.status.success(), "a readiness failure before fleet readiness must fail start()");
    assert!(
        outcome.stderr.contains("db"),
        "the failure should name the process that never became ready, got: {}",
        outcome.stderr
    );
    assert!(!project.socket_path().exists(), "teardown unlinks the control socket even on failure");
}
