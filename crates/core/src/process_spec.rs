// SPDX-License-Identifier: MIT

//! Declarative, immutable process specifications.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ready_check::ReadyCheck;

/// How a process is restarted after it exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Restart on any exit, bounded by `maxRetries`.
    Always,
    /// Restart on non-zero exit or probe failure, up to `maxRetries`.
    OnFailure,
    /// Terminal on first exit regardless of code.
    #[default]
    Never,
}

crate::simple_display! {
    RestartPolicy {
        Always => "always",
        OnFailure => "on-failure",
        Never => "never",
    }
}

/// Execution adapter selecting how a runner parses child output into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunnerKind {
    #[default]
    GenericShell,
    Container,
    ScriptRuntime,
    Bundler,
    UiBuild,
    DevServer,
}

crate::simple_display! {
    RunnerKind {
        GenericShell => "generic-shell",
        Container => "container",
        ScriptRuntime => "script-runtime",
        Bundler => "bundler",
        UiBuild => "ui-build",
        DevServer => "dev-server",
    }
}

impl RunnerKind {
    /// Runner kinds whose readiness is "build-complete", not "spawn succeeded".
    pub fn is_build_style(self) -> bool {
        matches!(self, RunnerKind::Bundler | RunnerKind::UiBuild)
    }
}

/// Deep vs. shallow integration with the multiplexer overview for a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationMode {
    /// Pane is created but not specially instrumented.
    Shallow,
    /// Pane output feeds the runner's build-event parser.
    Deep,
}

/// Which execution strategy a runner uses to launch the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStrategy {
    /// Spawned directly, stdout/stderr captured in-process.
    #[default]
    Direct,
    /// Created as a multiplexer pane; no in-band output capture.
    Pane,
}

/// Shell hooks run at fixed points in a process's lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hooks {
    pub pre_start: Option<String>,
    pub post_start: Option<String>,
    pub pre_stop: Option<String>,
    pub post_stop: Option<String>,
}

/// Default hook timeout per spec section 4.4 ("every hook has a bounded
/// timeout (default 60 seconds)").
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(60);

/// Declarative, immutable process specification.
///
/// Created at configuration load time and never mutated by the engine;
/// all mutable per-process state lives in [`crate::process_record::ProcessRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Unique, non-empty name.
    pub name: String,
    pub category: String,
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub dependencies: BTreeSet<String>,
    pub restart_policy: RestartPolicy,
    pub restart_delay: Duration,
    pub max_retries: u32,
    pub env: BTreeMap<String, String>,
    pub ready_check: Option<ReadyCheck>,
    pub hooks: Option<Hooks>,
    pub runner_kind: RunnerKind,
    pub integration_mode: Option<IntegrationMode>,
    /// Execution strategy for this process (Direct or Pane).
    pub strategy: ExecutionStrategy,
}

impl ProcessSpec {
    /// Resolve the child's working directory: the spec's `cwd` if present,
    /// else the caller-provided orchestrator working directory.
    pub fn resolve_cwd(&self, orchestrator_cwd: &std::path::Path) -> PathBuf {
        self.cwd.clone().unwrap_or_else(|| orchestrator_cwd.to_path_buf())
    }

    /// Merge the spec's `env` map over the given parent environment.
    /// Keys in `env` win (spec section 6).
    pub fn merged_env<'a>(
        &'a self,
        parent: impl IntoIterator<Item = (String, String)>,
    ) -> BTreeMap<String, String> {
        let mut merged: BTreeMap<String, String> = parent.into_iter().collect();
        for (k, v) in &self.env {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ProcessSpecBuilder => ProcessSpec {
        into { name: String = "proc" }
        into { category: String = "default" }
        into { command: String = "true" }
        set { cwd: Option<PathBuf> = None }
        set { dependencies: BTreeSet<String> = BTreeSet::new() }
        set { restart_policy: RestartPolicy = RestartPolicy::Never }
        set { restart_delay: Duration = Duration::from_secs(0) }
        set { max_retries: u32 = 0 }
        set { env: BTreeMap<String, String> = BTreeMap::new() }
        set { ready_check: Option<ReadyCheck> = None }
        set { hooks: Option<Hooks> = None }
        set { runner_kind: RunnerKind = RunnerKind::GenericShell }
        set { integration_mode: Option<IntegrationMode> = None }
        set { strategy: ExecutionStrategy = ExecutionStrategy::Direct }
    }
}

#[cfg(test)]
#[path = "process_spec_tests.rs"]
mod tests;
