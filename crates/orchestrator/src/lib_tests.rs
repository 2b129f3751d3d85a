// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use procwave_config::EngineConfig;
use procwave_core::{Hooks, ProcessSpec, ReadyCheck, RestartPolicy};
use procwave_runner::multiplexer::NoopMultiplexer;

use super::*;

fn boot_options() -> procwave_config::BootOptions {
    procwave_config::BootOptions {
        use_multiplexer: false,
        graceful_stop_timeout: Duration::from_millis(200),
        status_tick_interval: Duration::from_millis(50),
    }
}

fn config_with(processes: Vec<ProcessSpec>) -> EngineConfig {
    EngineConfig {
        project: "testproj".to_string(),
        categories: BTreeMap::new(),
        processes: processes.into_iter().map(|p| (p.name.clone(), p)).collect(),
        global_hooks: Hooks::default(),
        preflight_checks: Vec::new(),
        boot: boot_options(),
    }
}

fn socket_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("ctl.sock")
}

fn new_orchestrator(
    config: EngineConfig,
    dir: &tempfile::TempDir,
) -> Arc<Orchestrator> {
    Orchestrator::new_with_multiplexer(config, dir.path().to_path_buf(), socket_path(dir), Arc::new(NoopMultiplexer))
        .expect("config resolves")
}

#[test]
fn waves_reflect_configured_dependencies() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = ProcessSpec::builder().name("db").command("true").build();
    let api = ProcessSpec::builder()
        .name("api")
        .command("true")
        .dependencies(["db".to_string()].into_iter().collect())
        .build();
    let orchestrator = new_orchestrator(config_with(vec![db, api]), &dir);

    assert_eq!(orchestrator.waves().0, vec![vec!["db".to_string()], vec!["api".to_string()]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn start_then_stop_happy_path_runs_in_dependency_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = ProcessSpec::builder().name("db").command("sleep 5").build();
    let api = ProcessSpec::builder()
        .name("api")
        .command("sleep 5")
        .dependencies(["db".to_string()].into_iter().collect())
        .build();
    let orchestrator = new_orchestrator(config_with(vec![db, api]), &dir);

    orchestrator.start(None).await.expect("start succeeds");

    let db_status = orchestrator.get_status("db").await.expect("db tracked");
    let api_status = orchestrator.get_status("api").await.expect("api tracked");
    assert_eq!(db_status.status, procwave_core::ProcessStatus::Running);
    assert_eq!(api_status.status, procwave_core::ProcessStatus::Running);
    assert!(db_status.pid.is_some());

    orchestrator.stop(None).await.expect("stop succeeds");
    assert!(!socket_path(&dir).exists(), "full stop unlinks the control socket");
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_readiness_cascades_and_blocks_dependents() {
    let dir = tempfile::tempdir().expect("tempdir");
    // An unused local port: the ready check never succeeds, so `db` fails
    // before it becomes ready and `api` must never be started at all.
    let db = ProcessSpec::builder()
        .name("db")
        .command("true")
        .ready_check(Some(ReadyCheck::Tcp {
            host: "127.0.0.1".to_string(),
            port: 1,
            timeout: Duration::from_millis(150),
            interval: Duration::from_millis(20),
            max_attempts: 3,
        }))
        .build();
    let api = ProcessSpec::builder()
        .name("api")
        .command("sleep 5")
        .dependencies(["db".to_string()].into_iter().collect())
        .build();
    let orchestrator = new_orchestrator(config_with(vec![db, api]), &dir);

    let result = orchestrator.start(None).await;
    match result {
        Err(OrchestratorError::ProcessFailedBeforeReady(name, _)) => assert_eq!(name, "db"),
        other => panic!("expected cascade failure naming db, got {other:?}"),
    }

    let api_status = orchestrator.get_status("api").await.expect("api tracked");
    assert_eq!(
        api_status.status,
        procwave_core::ProcessStatus::Pending,
        "api must never start once db fails before readiness"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn restart_without_a_running_engine_reports_not_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = ProcessSpec::builder().name("db").command("true").build();
    let orchestrator = new_orchestrator(config_with(vec![db]), &dir);

    let err = orchestrator.restart(&["db".to_string()]).await.expect_err("not running yet");
    assert!(matches!(err, OrchestratorError::NotRunning));
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_without_a_running_engine_reports_not_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = ProcessSpec::builder().name("db").command("true").build();
    let orchestrator = new_orchestrator(config_with(vec![db]), &dir);

    let err = orchestrator.stop(None).await.expect_err("not running yet");
    assert!(matches!(err, OrchestratorError::NotRunning));
}

#[tokio::test(flavor = "multi_thread")]
async fn restart_of_unknown_process_is_rejected_once_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = ProcessSpec::builder().name("db").command("sleep 5").build();
    let orchestrator = new_orchestrator(config_with(vec![db]), &dir);
    orchestrator.start(None).await.expect("start succeeds");

    let err = orchestrator
        .restart(&["ghost".to_string()])
        .await
        .expect_err("ghost is not configured");
    assert!(matches!(err, OrchestratorError::UnknownProcess(name) if name == "ghost"));

    orchestrator.stop(None).await.expect("stop succeeds");
}
