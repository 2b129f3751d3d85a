use super::*;

#[test]
fn empty_waves_report_empty() {
    let waves = Waves(vec![]);
    assert!(waves.is_empty());
    assert_eq!(waves.len(), 0);
    assert_eq!(waves.process_count(), 0);
}

#[test]
fn waves_with_empty_inner_vecs_are_still_empty() {
    let waves = Waves(vec![vec![], vec![]]);
    assert!(waves.is_empty());
}

#[test]
fn process_count_sums_across_waves() {
    let waves = Waves(vec![
        vec!["db".to_string(), "cache".to_string()],
        vec!["api".to_string()],
        vec!["web".to_string()],
    ]);
    assert!(!waves.is_empty());
    assert_eq!(waves.len(), 3);
    assert_eq!(waves.process_count(), 4);
}

#[test]
fn wave_of_finds_the_right_index() {
    let waves = Waves(vec![vec!["db".to_string()], vec!["api".to_string(), "worker".to_string()]]);
    assert_eq!(waves.wave_of("db"), Some(0));
    assert_eq!(waves.wave_of("worker"), Some(1));
    assert_eq!(waves.wave_of("missing"), None);
}

#[test]
fn iter_visits_waves_in_order() {
    let waves = Waves(vec![vec!["a".to_string()], vec!["b".to_string()]]);
    let flattened: Vec<&String> = waves.iter().flatten().collect();
    assert_eq!(flattened, vec!["a", "b"]);
}
