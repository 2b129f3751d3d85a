use std::path::Path;

use super::*;

#[test]
fn builder_produces_sane_defaults() {
    let spec = ProcessSpec::builder().build();
    assert_eq!(spec.name, "proc");
    assert_eq!(spec.restart_policy, RestartPolicy::Never);
    assert!(spec.dependencies.is_empty());
    assert_eq!(spec.strategy, ExecutionStrategy::Direct);
}

#[test]
fn resolve_cwd_falls_back_to_orchestrator_cwd() {
    let spec = ProcessSpec::builder().build();
    let fallback = Path::new("/srv/app");
    assert_eq!(spec.resolve_cwd(fallback), fallback.to_path_buf());
}

#[test]
fn resolve_cwd_prefers_spec_cwd() {
    let spec = ProcessSpec::builder().cwd(Some("/srv/app/web".into())).build();
    assert_eq!(spec.resolve_cwd(Path::new("/srv/app")), std::path::PathBuf::from("/srv/app/web"));
}

#[test]
fn merged_env_overlay_wins_over_parent() {
    let mut env = BTreeMap::new();
    env.insert("PORT".to_string(), "4000".to_string());
    let spec = ProcessSpec::builder().env(env).build();

    let parent = vec![("PORT".to_string(), "3000".to_string()), ("HOME".to_string(), "/root".to_string())];
    let merged = spec.merged_env(parent);

    assert_eq!(merged.get("PORT").map(String::as_str), Some("4000"));
    assert_eq!(merged.get("HOME").map(String::as_str), Some("/root"));
}

#[yare::parameterized(
    bundler = { RunnerKind::Bundler },
    ui_build = { RunnerKind::UiBuild },
)]
fn build_style_kinds(kind: RunnerKind) {
    assert!(kind.is_build_style());
}

#[yare::parameterized(
    generic_shell = { RunnerKind::GenericShell },
    container = { RunnerKind::Container },
    script_runtime = { RunnerKind::ScriptRuntime },
    dev_server = { RunnerKind::DevServer },
)]
fn non_build_style_kinds(kind: RunnerKind) {
    assert!(!kind.is_build_style());
}

#[test]
fn restart_policy_round_trips_through_json() {
    let json = serde_json::to_string(&RestartPolicy::OnFailure).unwrap();
    assert_eq!(json, "\"on-failure\"");
    let back: RestartPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(back, RestartPolicy::OnFailure);
}

#[test]
fn process_spec_serializes_with_kebab_case_enums() {
    let spec = ProcessSpec::builder()
        .name("web")
        .restart_policy(RestartPolicy::Always)
        .runner_kind(RunnerKind::DevServer)
        .strategy(ExecutionStrategy::Pane)
        .build();
    let json = serde_json::to_value(&spec).unwrap();
    assert_eq!(json["restart_policy"], "always");
    assert_eq!(json["runner_kind"], "dev-server");
    assert_eq!(json["strategy"], "pane");
}
