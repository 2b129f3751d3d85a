use procwave_core::ProcessSpec;

use super::*;

fn spec(name: &str, deps: &[&str]) -> ProcessSpec {
    ProcessSpec::builder()
        .name(name)
        .dependencies(deps.iter().map(|d| d.to_string()).collect())
        .build()
}

#[test]
fn empty_input_resolves_to_empty_order_and_waves() {
    let specs: Vec<ProcessSpec> = Vec::new();
    assert_eq!(topological_order(&specs).unwrap(), Vec::<String>::new());
    let waves = into_waves(&specs).unwrap();
    assert!(waves.is_empty());
}

#[test]
fn single_process_with_no_deps_is_one_wave_of_one() {
    let specs = vec![spec("solo", &[])];
    let waves = into_waves(&specs).unwrap();
    assert_eq!(waves.len(), 1);
    assert_eq!(waves.process_count(), 1);
}

fn chain(depth: usize) -> Vec<ProcessSpec> {
    let names: Vec<String> = (0..depth).map(|i| format!("p{i}")).collect();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                spec(name, &[])
            } else {
                spec(name, &[names[i - 1].as_str()])
            }
        })
        .collect()
}

#[yare::parameterized(
    one   = { 1 },
    two   = { 2 },
    four  = { 4 },
    eight = { 8 },
)]
fn chain_of_depth_n_produces_n_waves(depth: usize) {
    let specs = chain(depth);
    let waves = into_waves(&specs).unwrap();
    assert_eq!(waves.len(), depth);
    for i in 0..depth {
        assert_eq!(waves.wave_of(&format!("p{i}")), Some(i));
    }
}

#[test]
fn diamond_dependency_has_width_two_middle_wave() {
    let specs = vec![
        spec("top", &[]),
        spec("left", &["top"]),
        spec("right", &["top"]),
        spec("bottom", &["left", "right"]),
    ];
    let waves = into_waves(&specs).unwrap();
    assert_eq!(waves.len(), 3);
    assert_eq!(waves.0[1].len(), 2);
    assert_eq!(waves.wave_of("bottom"), Some(2));
}

#[test]
fn topological_order_respects_every_edge() {
    let specs = vec![spec("db", &[]), spec("api", &["db"]), spec("ui", &["api"])];
    let order = topological_order(&specs).unwrap();
    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(pos("db") < pos("api"));
    assert!(pos("api") < pos("ui"));
}

#[test]
fn ties_break_lexicographically() {
    let specs = vec![spec("zeta", &[]), spec("alpha", &[]), spec("mu", &[])];
    let order = topological_order(&specs).unwrap();
    assert_eq!(order, vec!["alpha", "mu", "zeta"]);
}

#[test]
fn missing_dependency_is_reported_by_name() {
    let specs = vec![spec("x", &["y"])];
    let err = topological_order(&specs).unwrap_err();
    assert_eq!(
        err,
        ResolveError::MissingDependency { process: "x".to_string(), dep: "y".to_string() }
    );
}

#[test]
fn direct_cycle_is_detected() {
    let specs = vec![spec("a", &["b"]), spec("b", &["a"])];
    let err = topological_order(&specs).unwrap_err();
    match err {
        ResolveError::CircularDependency { cycle } => {
            assert!(cycle.contains(&"a".to_string()));
            assert!(cycle.contains(&"b".to_string()));
        }
        other => panic!("expected CircularDependency, got {other:?}"),
    }
}

#[test]
fn longer_cycle_is_detected() {
    let specs = vec![spec("a", &["b"]), spec("b", &["c"]), spec("c", &["a"])];
    assert!(matches!(
        topological_order(&specs).unwrap_err(),
        ResolveError::CircularDependency { .. }
    ));
}
