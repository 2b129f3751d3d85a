//! Scenario 2 (section 8): a circular dependency fails `start()` before any
//! child spawns, and leaves no control socket behind.

use crate::support::{run, TestProject};

#[test]
fn circular_dependency_fails_before_any_spawn_and_leaves_no_socket() {
    let project = TestProject::new();
    project.write_config(
        r#"
project = "circular"

[boot]
use_multiplexer = false

[processes.a]
command = "true"
dependencies = ["b"]

[processes.b]
command = "true"
dependencies = ["a"]
"#,
    );

    let outcome = run(&project, &["start"]);

    assert!(!outcome.status.success(), "a circular dependency must fail start()");
    assert!(
        outcome.stderr.to_lowercase().contains("circular"),
        "stderr should name the circular dependency, got: {}",
        outcome.stderr
    );
    assert!(!project.socket_path().exists(), "no socket file should be left behind");
}
