use std::path::PathBuf;
use std::time::Duration;

use procwave_core::{ExecutionStrategy, ReadyCheck, RestartPolicy};

use super::*;

fn origin() -> PathBuf {
    PathBuf::from("<test>")
}

#[test]
fn loads_a_minimal_document() {
    let toml = r#"
        project = "demo"

        [processes.db]
        command = "postgres"
    "#;
    let config = load_from_str(toml, origin()).unwrap();
    assert_eq!(config.project, "demo");
    assert_eq!(config.processes.len(), 1);
    let db = &config.processes["db"];
    assert_eq!(db.command, "postgres");
    assert_eq!(db.restart_policy, RestartPolicy::Never);
    assert_eq!(db.restart_delay, Duration::from_millis(0));
}

#[test]
fn parses_dependencies_and_ready_checks() {
    let toml = r#"
        project = "demo"

        [processes.db]
        command = "postgres"

        [processes.db.ready_check]
        kind = "tcp"
        host = "127.0.0.1"
        port = 5432

        [processes.api]
        command = "node server.js"
        dependencies = ["db"]
        restart_policy = "on-failure"
        restart_delay = "250ms"
        max_retries = 3

        [processes.api.ready_check]
        kind = "http"
        url = "http://localhost:3000/health"
        timeout = "5s"
    "#;
    let config = load_from_str(toml, origin()).unwrap();

    let api = &config.processes["api"];
    assert!(api.dependencies.contains("db"));
    assert_eq!(api.restart_policy, RestartPolicy::OnFailure);
    assert_eq!(api.restart_delay, Duration::from_millis(250));
    assert_eq!(api.max_retries, 3);

    match &api.ready_check {
        Some(ReadyCheck::Http { url, timeout, .. }) => {
            assert_eq!(url, "http://localhost:3000/health");
            assert_eq!(*timeout, Duration::from_secs(5));
        }
        other => panic!("expected Http ready check, got {other:?}"),
    }
}

#[test]
fn rejects_unknown_dependency_through_the_full_pipeline() {
    let toml = r#"
        project = "demo"

        [processes.api]
        command = "node server.js"
        dependencies = ["db"]
    "#;
    let err = load_from_str(toml, origin()).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownDependency { .. }));
}

#[test]
fn rejects_invalid_duration_strings() {
    let toml = r#"
        project = "demo"

        [processes.api]
        command = "node server.js"
        restart_delay = "soon"
    "#;
    let err = load_from_str(toml, origin()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidProcess { .. }));
}

#[test]
fn parses_global_hooks_and_preflight_checks() {
    let toml = r#"
        project = "demo"

        [hooks]
        pre_start = "echo starting fleet"
        post_stop = "echo fleet stopped"

        [[preflight.checks]]
        name = "docker running"
        command = "docker info"
        timeout = "2s"

        [processes.db]
        command = "postgres"
    "#;
    let config = load_from_str(toml, origin()).unwrap();
    assert_eq!(config.global_hooks.pre_start.as_deref(), Some("echo starting fleet"));
    assert_eq!(config.global_hooks.post_stop.as_deref(), Some("echo fleet stopped"));
    assert_eq!(config.preflight_checks.len(), 1);
    assert_eq!(config.preflight_checks[0].name, "docker running");
    assert_eq!(config.preflight_checks[0].timeout, Duration::from_secs(2));
}

#[test]
fn rejects_log_pattern_ready_check_under_pane_strategy() {
    let toml = r#"
        project = "demo"

        [processes.web]
        command = "npm run dev"
        strategy = "pane"

        [processes.web.ready_check]
        kind = "log-pattern"
        pattern = "ready"
    "#;
    let err = load_from_str(toml, origin()).unwrap_err();
    assert!(matches!(err, ConfigError::LogPatternUnderPane { .. }));
}

#[test]
fn boot_options_default_to_documented_values() {
    let toml = r#"
        project = "demo"

        [processes.db]
        command = "postgres"
    "#;
    let config = load_from_str(toml, origin()).unwrap();
    assert!(config.boot.use_multiplexer);
    assert_eq!(config.boot.graceful_stop_timeout, Duration::from_secs(10));
    assert_eq!(config.boot.status_tick_interval, Duration::from_secs(1));
}

#[test]
fn strategy_and_runner_kind_parse_from_kebab_case() {
    let toml = r#"
        project = "demo"

        [processes.web]
        command = "npm run build"
        runner_kind = "ui-build"
        strategy = "direct"
    "#;
    let config = load_from_str(toml, origin()).unwrap();
    assert_eq!(config.processes["web"].strategy, ExecutionStrategy::Direct);
}
