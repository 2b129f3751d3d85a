// SPDX-License-Identifier: MIT

//! Port-availability preflight check (section 4.2): binds a throwaway
//! `TcpListener` per port derived from spec fields, and on conflict attempts
//! best-effort occupant discovery (pid, command, user) that is itself
//! allowed to fail without making the conflict report fail.

use std::collections::BTreeSet;
use std::net::TcpListener;
use std::time::Instant;

use procwave_core::{ProcessSpec, ReadyCheck};
use regex::Regex;
use sysinfo::{Pid, System};

use crate::report::CheckResult;

/// Pull every port this spec is plausibly bound to: explicit `tcp`/`http`
/// ready-check ports, plus a best-effort regex scan of the command line for
/// `--port N` / `-p N` / `:N` patterns (section 4.2: "derived from spec
/// fields and a regex over commands").
fn ports_for_spec(spec: &ProcessSpec) -> BTreeSet<u16> {
    let mut ports = BTreeSet::new();

    match &spec.ready_check {
        Some(ReadyCheck::Tcp { port, .. }) => {
            ports.insert(*port);
        }
        Some(ReadyCheck::Http { url, .. }) => {
            if let Some(port) = port_from_url(url) {
                ports.insert(port);
            }
        }
        _ => {}
    }

    #[allow(clippy::expect_used)]
    let re = Regex::new(r"(?:--port[= ]|-p[= ])(\d{2,5})\b|:(\d{2,5})\b")
        .expect("static regex is valid");
    for caps in re.captures_iter(&spec.command) {
        let raw = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        if let Some(port) = raw.and_then(|s| s.parse::<u16>().ok()) {
            ports.insert(port);
        }
    }

    ports
}

fn port_from_url(url: &str) -> Option<u16> {
    let after_scheme = url.split("://").nth(1).unwrap_or(url);
    let host_port = after_scheme.split('/').next().unwrap_or(after_scheme);
    host_port.rsplit_once(':').and_then(|(_, port)| port.parse().ok())
}

/// Run the derived port-availability check against every spec.
pub async fn check_ports(specs: &[&ProcessSpec]) -> CheckResult {
    let started = Instant::now();
    let mut all_ports: BTreeSet<u16> = BTreeSet::new();
    for spec in specs {
        all_ports.extend(ports_for_spec(spec));
    }

    let mut conflicts = Vec::new();
    for port in all_ports {
        if TcpListener::bind(("127.0.0.1", port)).is_err() {
            let occupant = find_port_occupant(port);
            conflicts.push(match occupant {
                Some(occupant) => format!(
                    "port {port} is in use (pid {}, {}, user {})",
                    occupant.pid, occupant.command, occupant.user
                ),
                None => format!("port {port} is in use (occupant could not be determined)"),
            });
        }
    }

    if conflicts.is_empty() {
        CheckResult::pass("port-availability", started.elapsed())
    } else {
        CheckResult::fail(
            "port-availability",
            conflicts.join("; "),
            Some("stop the conflicting process or choose a different port".to_string()),
            started.elapsed(),
        )
    }
}

struct PortOccupant {
    pid: u32,
    command: String,
    user: String,
}

/// Best-effort discovery of the process bound to `port` (section 4.2:
/// "failure of the discovery step is non-fatal"). Reads `/proc/net/tcp` for
/// the inode bound to `port`, maps it to a pid via `/proc/*/fd/*` symlinks,
/// then looks up command/user via `sysinfo`. Returns `None` on any Linux
/// specificity this host doesn't support (non-Linux, permission-denied,
/// parse failure) rather than erroring the caller.
fn find_port_occupant(port: u16) -> Option<PortOccupant> {
    let inode = find_inode_for_port(port)?;
    let pid = find_pid_for_inode(inode)?;

    let mut system = System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
    let process = system.process(Pid::from_u32(pid))?;
    let command = process
        .cmd()
        .first()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| process.name().to_string_lossy().into_owned());
    let user = process
        .user_id()
        .map(|uid| uid.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Some(PortOccupant { pid, command, user })
}

fn find_inode_for_port(port: u16) -> Option<u64> {
    let text = std::fs::read_to_string("/proc/net/tcp").ok()?;
    let hex_port = format!("{port:04X}");
    for line in text.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let local = fields.first()?;
        let (_, local_port) = local.split_once(':')?;
        if local_port.eq_ignore_ascii_case(&hex_port) {
            return fields.get(9)?.parse().ok();
        }
    }
    None
}

fn find_pid_for_inode(inode: u64) -> Option<u32> {
    let needle = format!("socket:[{inode}]");
    let proc_dir = std::fs::read_dir("/proc").ok()?;
    for entry in proc_dir.flatten() {
        let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else { continue };
        let fd_dir = entry.path().join("fd");
        let Ok(fds) = std::fs::read_dir(&fd_dir) else { continue };
        for fd in fds.flatten() {
            if let Ok(target) = std::fs::read_link(fd.path()) {
                if target.to_string_lossy() == needle {
                    return Some(pid);
                }
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
