// SPDX-License-Identifier: MIT

//! Wave partitioning of the process dependency graph (section 3, section 4.1).

use serde::{Deserialize, Serialize};

/// An ordered sequence of sets of process names. Wave `i` depends only on
/// processes from waves `< i`.
///
/// Invariant: the union of all waves equals the set of process names;
/// intersection between waves is empty (section 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waves(pub Vec<Vec<String>>);

impl Waves {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|wave| wave.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Total number of process names across all waves.
    pub fn process_count(&self) -> usize {
        self.0.iter().map(|wave| wave.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<String>> {
        self.0.iter()
    }

    /// The wave index containing `name`, if any.
    pub fn wave_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|wave| wave.iter().any(|n| n == name))
    }
}

#[cfg(test)]
#[path = "wave_tests.rs"]
mod tests;
