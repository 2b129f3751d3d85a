//! Scenario 3 (section 8): a process naming an unconfigured dependency
//! fails `start()` before any child spawns.

use crate::support::{run, TestProject};

#[test]
fn missing_dependency_fails_start_by_name() {
    let project = TestProject::new();
    project.write_config(
        r#"
project = "missing-dep"

[boot]
use_multiplexer = false

[processes.x]
command = "true"
dependencies = ["y"]
"#,
    );

    let outcome = run(&project, &["start"]);

    assert!(!outcome.status.success(), "an unresolved dependency must fail start()");
    assert!(
        outcome.stderr.contains('x') && outcome.stderr.contains('y'),
        "stderr should name both the process and its missing dependency, got: {}",
        outcome.stderr
    );
    assert!(!project.socket_path().exists());
}
