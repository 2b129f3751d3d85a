// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-resolver: orders a set of process specs by dependency, and
//! partitions them into parallel-startable waves.
//!
//! Kahn's algorithm with lexicographic tie-breaking gives a deterministic
//! topological order; each node's wave is `max(wave[dep]) + 1` over its
//! dependencies, or `0` with none.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use procwave_core::{ProcessSpec, Waves};
use thiserror::Error;

/// Errors a dependency graph can fail to resolve with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("process {process:?} depends on unknown process {dep:?}")]
    MissingDependency { process: String, dep: String },

    #[error("circular dependency: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },
}

/// Topologically order `specs` by dependency, breaking ties lexicographically
/// by name. The returned list is a permutation of the input names.
pub fn topological_order(specs: &[ProcessSpec]) -> Result<Vec<String>, ResolveError> {
    let names: BTreeSet<&str> = specs.iter().map(|s| s.name.as_str()).collect();
    check_missing_dependencies(specs, &names)?;

    let mut in_degree: BTreeMap<&str, usize> =
        specs.iter().map(|s| (s.name.as_str(), s.dependencies.len())).collect();
    // dependents[d] = processes that depend on d
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for spec in specs {
        for dep in &spec.dependencies {
            dependents.entry(dep.as_str()).or_default().push(spec.name.as_str());
        }
    }
    for deps in dependents.values_mut() {
        deps.sort_unstable();
    }

    let mut ready: BTreeSet<&str> =
        in_degree.iter().filter(|(_, &deg)| deg == 0).map(|(&n, _)| n).collect();
    let mut order = Vec::with_capacity(specs.len());

    while let Some(&name) = ready.iter().next() {
        ready.remove(name);
        order.push(name.to_string());
        if let Some(deps) = dependents.get(name) {
            for &dependent in deps {
                #[allow(clippy::expect_used)]
                let degree = in_degree.get_mut(dependent).expect("dependent tracked in in_degree");
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if order.len() != specs.len() {
        return Err(ResolveError::CircularDependency { cycle: find_cycle(specs) });
    }

    Ok(order)
}

/// Partition `specs` into waves: wave `i` depends only on waves `< i`.
pub fn into_waves(specs: &[ProcessSpec]) -> Result<Waves, ResolveError> {
    let order = topological_order(specs)?;
    let by_name: BTreeMap<&str, &ProcessSpec> =
        specs.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut wave_of: BTreeMap<&str, usize> = BTreeMap::new();
    let mut max_wave = 0usize;
    for name in &order {
        let spec = by_name[name.as_str()];
        let wave = spec
            .dependencies
            .iter()
            .map(|dep| wave_of.get(dep.as_str()).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        wave_of.insert(name.as_str(), wave);
        max_wave = max_wave.max(wave);
    }

    let mut waves = vec![Vec::new(); max_wave + 1];
    for name in &order {
        waves[wave_of[name.as_str()]].push(name.clone());
    }
    // within a wave, keep lexicographic order for determinism
    for wave in &mut waves {
        wave.sort_unstable();
    }

    Ok(Waves(waves))
}

fn check_missing_dependencies(
    specs: &[ProcessSpec],
    names: &BTreeSet<&str>,
) -> Result<(), ResolveError> {
    for spec in specs {
        for dep in &spec.dependencies {
            if !names.contains(dep.as_str()) {
                return Err(ResolveError::MissingDependency {
                    process: spec.name.clone(),
                    dep: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Recover a witness cycle via DFS over the unresolved portion of the graph,
/// marking the recursion stack; the first back-edge found is the reported
/// cycle.
fn find_cycle(specs: &[ProcessSpec]) -> Vec<String> {
    let by_name: BTreeMap<&str, &ProcessSpec> =
        specs.iter().map(|s| (s.name.as_str(), s)).collect();

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
    let mut stack: Vec<&str> = Vec::new();

    fn visit<'a>(
        node: &'a str,
        by_name: &BTreeMap<&'a str, &'a ProcessSpec>,
        marks: &mut BTreeMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(Mark::Visiting) = marks.get(node) {
            let start = stack.iter().position(|&n| n == node).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        if marks.get(node) == Some(&Mark::Done) {
            return None;
        }

        marks.insert(node, Mark::Visiting);
        stack.push(node);
        if let Some(spec) = by_name.get(node) {
            let mut deps: Vec<&str> = spec.dependencies.iter().map(|d| d.as_str()).collect();
            deps.sort_unstable();
            for dep in deps {
                if let Some(cycle) = visit(dep, by_name, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut names: Vec<&str> = by_name.keys().copied().collect();
    names.sort_unstable();
    for name in names {
        if marks.contains_key(name) {
            continue;
        }
        if let Some(cycle) = visit(name, &by_name, &mut marks, &mut stack) {
            return cycle;
        }
    }

    // Every spec reported in a cycle by the caller; this is unreachable
    // unless topological_order's count mismatch was itself a bug.
    Vec::new()
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "resolver_proptests.rs"]
mod proptests;
