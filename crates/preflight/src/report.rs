// SPDX-License-Identifier: MIT

use std::time::Duration;

use thiserror::Error;

/// Outcome of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
    pub fix_suggestion: Option<String>,
    pub duration: Duration,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, duration: Duration) -> Self {
        Self { name: name.into(), passed: true, message: None, fix_suggestion: None, duration }
    }

    pub fn fail(
        name: impl Into<String>,
        message: impl Into<String>,
        fix_suggestion: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: Some(message.into()),
            fix_suggestion,
            duration,
        }
    }
}

/// The full set of results from one preflight run, in execution order
/// (built-ins, then the port check, then user-defined checks).
#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    pub results: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Fold the report into a single aggregate error naming every failed
    /// check, or `Ok(())` if every check passed (section 4.2 contract).
    pub fn into_result(self) -> Result<(), PreflightFailure> {
        let failed: Vec<CheckResult> = self.results.into_iter().filter(|r| !r.passed).collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(PreflightFailure { failed })
        }
    }
}

/// Aggregate preflight failure naming every check that did not pass.
#[derive(Debug, Error)]
#[error("preflight failed: {}", failed.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", "))]
pub struct PreflightFailure {
    pub failed: Vec<CheckResult>,
}
