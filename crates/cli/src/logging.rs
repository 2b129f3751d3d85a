// SPDX-License-Identifier: MIT

//! Structured logging setup (section "(ambient) Logging"): a subscriber
//! writing to stderr by default, plus a non-blocking rolling file appender
//! when `PROCWAVE_LOG_FILE` is set. Mirrors the teacher daemon's
//! `tracing-appender` pattern (`crates/daemon/src/main.rs::setup_logging`).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Guard returned by the non-blocking file appender; must be kept alive for
/// the process lifetime or buffered lines are dropped on exit.
pub struct LoggingGuard(#[allow(dead_code)] Option<tracing_appender::non_blocking::WorkerGuard>);

pub fn init() -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr));

    match crate::env::log_file_override() {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("procwave.log"));
            if let Err(err) = std::fs::create_dir_all(dir) {
                eprintln!("warning: could not create log directory {}: {err}", dir.display());
            }
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            registry.with(fmt::layer().with_writer(non_blocking).with_ansi(false)).init();
            LoggingGuard(Some(guard))
        }
        None => {
            registry.init();
            LoggingGuard(None)
        }
    }
}
