use std::collections::BTreeSet;

use procwave_core::ProcessSpec;
use proptest::prelude::*;

use super::*;

/// Build a DAG over `n` named processes where each process may depend only
/// on processes with a strictly smaller index, guaranteeing acyclicity.
fn dag_strategy(n: usize) -> impl Strategy<Value = Vec<ProcessSpec>> {
    let names: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
    let per_node = names
        .clone()
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let earlier: Vec<String> = names_up_to(&names, i);
            prop::collection::vec(prop::sample::select(earlier_or_empty(earlier)), 0..=i)
                .prop_map(move |deps| (name.clone(), deps.into_iter().flatten().collect::<BTreeSet<_>>()))
        })
        .collect::<Vec<_>>();
    per_node.prop_map(move |nodes| {
        nodes
            .into_iter()
            .map(|(name, deps)| ProcessSpec::builder().name(name).dependencies(deps).build())
            .collect()
    })
}

fn names_up_to(names: &[String], i: usize) -> Vec<String> {
    names[..i].to_vec()
}

fn earlier_or_empty(earlier: Vec<String>) -> Vec<Option<String>> {
    if earlier.is_empty() {
        vec![None]
    } else {
        earlier.into_iter().map(Some).collect()
    }
}

proptest! {
    #[test]
    fn resolver_is_deterministic_across_repeated_runs(specs in dag_strategy(8)) {
        let first = topological_order(&specs);
        let second = topological_order(&specs);
        prop_assert_eq!(first.clone(), second);

        if let Ok(order) = first {
            prop_assert_eq!(order.len(), specs.len());
            let by_name: std::collections::BTreeMap<_, _> =
                specs.iter().map(|s| (s.name.as_str(), s)).collect();
            for (idx, name) in order.iter().enumerate() {
                let spec = by_name[name.as_str()];
                for dep in &spec.dependencies {
                    let dep_idx = order.iter().position(|n| n == dep).expect("dep present");
                    prop_assert!(dep_idx < idx);
                }
            }
        }
    }

    #[test]
    fn waves_partition_the_process_set(specs in dag_strategy(8)) {
        if let Ok(waves) = into_waves(&specs) {
            prop_assert_eq!(waves.process_count(), specs.len());
            let by_name: std::collections::BTreeMap<_, _> =
                specs.iter().map(|s| (s.name.as_str(), s)).collect();
            for (wave_idx, wave) in waves.iter().enumerate() {
                for name in wave {
                    let spec = by_name[name.as_str()];
                    for dep in &spec.dependencies {
                        let dep_wave = waves.wave_of(dep).expect("dep present");
                        prop_assert!(dep_wave < wave_idx);
                    }
                }
            }
        }
    }
}
