// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-config: loads the TOML configuration document into the
//! in-memory value the engine consumes.
//!
//! The engine's own crates (resolver, preflight, supervisor, ...) never
//! parse configuration themselves — they consume [`EngineConfig`], which
//! has already had every duration string and enum validated. Schema
//! diagnostics beyond what the engine's own invariants require (pretty
//! error spans, did-you-mean suggestions) are out of scope; this crate is
//! deliberately thin.

mod def;
mod duration;
mod error;
mod loader;
mod validate;

pub use def::{BootOptions, ConfigDocument, HooksDef, ProcessSpecDef, ReadyCheckDef};
pub use duration::parse_duration;
pub use error::ConfigError;
pub use loader::{load_from_path, load_from_str, EngineConfig, PreflightCheckSpec};
