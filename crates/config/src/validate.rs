// SPDX-License-Identifier: MIT

//! Load-time structural validation (section 7: "Configuration errors ...
//! fatal at load; never raised after startup begins").

use procwave_core::ExecutionStrategy;

use crate::def::ConfigDocument;
use crate::error::ConfigError;

/// Checks that don't require resolver-level cycle detection (that lives in
/// `procwave-resolver`, which consumes the already-validated specs this
/// crate produces): unique/non-empty names, known dependency targets, and
/// the log-pattern/pane combination rejected at configuration time per the
/// REDESIGN note.
pub fn validate(doc: &ConfigDocument) -> Result<(), ConfigError> {
    for name in doc.processes.keys() {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyProcessName);
        }
    }

    for (name, spec) in &doc.processes {
        for dep in &spec.dependencies {
            if !doc.processes.contains_key(dep) {
                return Err(ConfigError::UnknownDependency {
                    process: name.clone(),
                    dep: dep.clone(),
                });
            }
        }

        if let Some(ready_check) = &spec.ready_check {
            let is_log_pattern = matches!(ready_check, crate::def::ReadyCheckDef::LogPattern { .. });
            if is_log_pattern && spec.strategy == ExecutionStrategy::Pane {
                return Err(ConfigError::LogPatternUnderPane { process: name.clone() });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
