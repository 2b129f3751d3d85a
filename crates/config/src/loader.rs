// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use procwave_core::{Hooks, ProcessSpec};

use crate::def::{BootOptions, ConfigDocument, HooksDef};
use crate::duration::parse_duration;
use crate::error::ConfigError;
use crate::validate;

/// A single process's ready-made domain spec plus its declared global position.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub project: String,
    pub categories: BTreeMap<String, String>,
    pub processes: BTreeMap<String, ProcessSpec>,
    pub global_hooks: Hooks,
    pub preflight_checks: Vec<PreflightCheckSpec>,
    pub boot: BootOptions,
}

/// A user-defined preflight check, duration already parsed.
#[derive(Debug, Clone)]
pub struct PreflightCheckSpec {
    pub name: String,
    pub command: String,
    pub message: Option<String>,
    pub fix_suggestion: Option<String>,
    pub timeout: Duration,
}

fn hooks_def_to_hooks(def: HooksDef) -> Hooks {
    Hooks {
        pre_start: def.pre_start,
        post_start: def.post_start,
        pre_stop: def.pre_stop,
        post_stop: def.post_stop,
    }
}

/// Load and validate a configuration document from a TOML file on disk.
pub fn load_from_path(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    load_from_str(&raw, path.to_path_buf())
}

/// Load and validate a configuration document from an in-memory TOML string.
///
/// `origin` is used only to annotate parse errors; it need not exist on disk.
pub fn load_from_str(raw: &str, origin: PathBuf) -> Result<EngineConfig, ConfigError> {
    let doc: ConfigDocument =
        toml::from_str(raw).map_err(|source| ConfigError::Parse { path: origin, source })?;

    validate::validate(&doc)?;

    let mut processes = BTreeMap::new();
    for (name, def) in doc.processes {
        let ready_check = def
            .ready_check
            .map(|rc| rc.into_ready_check())
            .transpose()
            .map_err(|message| ConfigError::InvalidProcess { process: name.clone(), message })?;

        let restart_delay = parse_duration(&def.restart_delay)
            .map_err(|message| ConfigError::InvalidProcess { process: name.clone(), message })?;

        let spec = ProcessSpec {
            name: name.clone(),
            category: def.category,
            command: def.command,
            cwd: def.cwd,
            dependencies: def.dependencies,
            restart_policy: def.restart_policy,
            restart_delay,
            max_retries: def.max_retries,
            env: def.env,
            ready_check,
            hooks: def.hooks.map(hooks_def_to_hooks),
            runner_kind: def.runner_kind,
            integration_mode: def.integration_mode,
            strategy: def.strategy,
        };
        processes.insert(name, spec);
    }

    let mut preflight_checks = Vec::with_capacity(doc.preflight.checks.len());
    for check in doc.preflight.checks {
        let timeout = parse_duration(&check.timeout).map_err(|message| {
            ConfigError::InvalidPreflightCheck { name: check.name.clone(), message }
        })?;
        preflight_checks.push(PreflightCheckSpec {
            name: check.name,
            command: check.command,
            message: check.message,
            fix_suggestion: check.fix_suggestion,
            timeout,
        });
    }

    Ok(EngineConfig {
        project: doc.project,
        categories: doc.categories,
        processes,
        global_hooks: hooks_def_to_hooks(doc.hooks),
        preflight_checks,
        boot: doc.boot.into_boot_options()?,
    })
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
