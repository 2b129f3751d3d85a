// SPDX-License-Identifier: MIT

//! Output-parsing adapters (section 4.3): each translates tool-specific
//! lines into the build-event contract. Only meaningful for the Direct
//! execution strategy — Pane captures no output at all.

use procwave_core::{BuildInfo, LogLevel, ProcessEvent, RunnerKind};
use regex::Regex;

/// One captured line in, zero or more events out.
pub trait OutputParser: Send {
    fn on_line(&mut self, level: LogLevel, line: &str) -> Vec<ProcessEvent>;

    /// The captured container id, for the `container` variant's stop
    /// sequence (graceful stop, force-kill, remove — section 4.3). `None`
    /// for every other parser.
    fn container_id(&self) -> Option<&str> {
        None
    }
}

/// `generic-shell` / `script-runtime`: passthrough, no parsing.
#[derive(Default)]
pub struct PassthroughParser;

impl OutputParser for PassthroughParser {
    fn on_line(&mut self, _level: LogLevel, _line: &str) -> Vec<ProcessEvent> {
        Vec::new()
    }
}

/// `container`: captures the first 64-hex-digit line of stdout as the
/// container id (section 4.3).
pub struct ContainerParser {
    id_pattern: Regex,
    pub container_id: Option<String>,
}

impl Default for ContainerParser {
    fn default() -> Self {
        Self {
            #[allow(clippy::expect_used)]
            id_pattern: Regex::new(r"^[0-9a-f]{64}$").expect("static pattern"),
            container_id: None,
        }
    }
}

impl OutputParser for ContainerParser {
    fn on_line(&mut self, level: LogLevel, line: &str) -> Vec<ProcessEvent> {
        if self.container_id.is_none() && level == LogLevel::Stdout && self.id_pattern.is_match(line.trim())
        {
            self.container_id = Some(line.trim().to_string());
        }
        Vec::new()
    }

    fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }
}

/// `bundler` / `ui-build`: progress percentage, error/warning counts,
/// bundle size, and a completion marker (section 4.3).
pub struct BundlerParser {
    progress_re: Regex,
    error_re: Regex,
    warning_re: Regex,
    size_re: Regex,
    complete_re: Regex,
    info: BuildInfo,
    started: bool,
}

impl Default for BundlerParser {
    fn default() -> Self {
        #[allow(clippy::expect_used)]
        Self {
            progress_re: Regex::new(r"(\d{1,3})%").expect("static pattern"),
            error_re: Regex::new(r"(?i)\berror\b").expect("static pattern"),
            warning_re: Regex::new(r"(?i)\bwarning\b").expect("static pattern"),
            size_re: Regex::new(r"(?i)([\d.]+)\s*(kb|mb|b)\b").expect("static pattern"),
            complete_re: Regex::new(r"(?i)\b(built|compiled|done|build complete)\b").expect("static pattern"),
            info: BuildInfo::default(),
            started: false,
        }
    }
}

fn parse_size_bytes(value: f64, unit: &str) -> u64 {
    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "kb" => 1024.0,
        "mb" => 1024.0 * 1024.0,
        _ => 1.0,
    };
    (value * multiplier).round() as u64
}

impl OutputParser for BundlerParser {
    fn on_line(&mut self, _level: LogLevel, line: &str) -> Vec<ProcessEvent> {
        let mut events = Vec::new();
        let mut changed = false;

        if !self.started {
            self.started = true;
            events.push(ProcessEvent::BuildStart);
            events.push(ProcessEvent::Status { status: procwave_core::ProcessStatus::Building });
        }

        if let Some(m) = self.progress_re.captures(line) {
            if let Some(pct) = m.get(1).and_then(|m| m.as_str().parse::<u8>().ok()) {
                self.info.progress = pct.min(100);
                changed = true;
            }
        }
        if self.error_re.is_match(line) {
            self.info.errors += 1;
            changed = true;
        }
        if self.warning_re.is_match(line) {
            self.info.warnings += 1;
            changed = true;
        }
        if let Some(m) = self.size_re.captures(line) {
            if let (Some(value), Some(unit)) = (m.get(1), m.get(2)) {
                if let Ok(value) = value.as_str().parse::<f64>() {
                    self.info.size_bytes = Some(parse_size_bytes(value, unit.as_str()));
                    changed = true;
                }
            }
        }

        if self.complete_re.is_match(line) {
            let success = self.info.errors == 0;
            self.info.last_build_success = Some(success);
            self.info.progress = 100;
            events.push(if success {
                ProcessEvent::BuildComplete { info: self.info.clone() }
            } else {
                ProcessEvent::BuildFailed { info: self.info.clone() }
            });
            self.started = false;
            self.info = BuildInfo::default();
        } else if changed {
            events.push(ProcessEvent::BuildProgress { info: self.info.clone() });
        }

        events
    }
}

/// `dev-server`: parses a "ready" banner to transition to running; treats
/// rebuild/HMR markers as a transient building state (section 4.3).
pub struct DevServerParser {
    ready_re: Regex,
    rebuild_re: Regex,
    building: bool,
}

impl Default for DevServerParser {
    fn default() -> Self {
        #[allow(clippy::expect_used)]
        Self {
            ready_re: Regex::new(r"(?i)\b(ready|listening|started server)\b").expect("static pattern"),
            rebuild_re: Regex::new(r"(?i)\b(rebuild|hmr|hot.?(reload|update))\b").expect("static pattern"),
            building: false,
        }
    }
}

impl OutputParser for DevServerParser {
    fn on_line(&mut self, _level: LogLevel, line: &str) -> Vec<ProcessEvent> {
        if self.rebuild_re.is_match(line) {
            self.building = true;
            return vec![ProcessEvent::Status { status: procwave_core::ProcessStatus::Building }];
        }
        if self.ready_re.is_match(line) {
            let was_building = self.building;
            self.building = false;
            return vec![if was_building {
                ProcessEvent::Status { status: procwave_core::ProcessStatus::Running }
            } else {
                ProcessEvent::Ready
            }];
        }
        Vec::new()
    }
}

/// Choose the parsing adapter for a runner kind (Direct strategy only).
pub fn for_runner_kind(kind: RunnerKind) -> Box<dyn OutputParser> {
    match kind {
        RunnerKind::GenericShell | RunnerKind::ScriptRuntime => Box::new(PassthroughParser),
        RunnerKind::Container => Box::new(ContainerParser::default()),
        RunnerKind::Bundler | RunnerKind::UiBuild => Box::new(BundlerParser::default()),
        RunnerKind::DevServer => Box::new(DevServerParser::default()),
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
