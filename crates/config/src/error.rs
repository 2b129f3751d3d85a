// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading and validating a configuration document.
///
/// All variants are fatal at load time; none of them are ever raised once
/// the engine has begun starting processes (section 7 error taxonomy).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse TOML in {path}: {source}")]
    Parse { path: PathBuf, #[source] source: toml::de::Error },

    #[error("process name must not be empty")]
    EmptyProcessName,

    #[error("process {process:?} depends on unknown process {dep:?}")]
    UnknownDependency { process: String, dep: String },

    #[error(
        "process {process:?} uses a log-pattern ready check under the pane execution strategy; \
         log-pattern is only available under the direct strategy"
    )]
    LogPatternUnderPane { process: String },

    #[error("process {process:?}: {message}")]
    InvalidProcess { process: String, message: String },

    #[error("preflight check {name:?}: {message}")]
    InvalidPreflightCheck { name: String, message: String },
}
