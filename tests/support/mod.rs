// SPDX-License-Identifier: MIT

//! Shared scaffolding for the workspace-level black-box specs: write a
//! configuration document to a temp dir, drive the compiled `procwave`
//! binary against it, and talk to its control socket directly.

use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use assert_cmd::Command as AssertCommand;
use tempfile::TempDir;

/// A scratch project directory holding a `procwave.toml` and the control
/// socket path the engine will bind under it.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("create temp project dir") }
    }

    /// Write `toml` as this project's configuration document and return its
    /// path.
    pub fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.dir.path().join("procwave.toml");
        std::fs::write(&path, toml).expect("write procwave.toml");
        path
    }

    pub fn socket_path(&self) -> PathBuf {
        self.dir.path().join("ctl.sock")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_procwave"))
}

/// Run `procwave --config <path> --socket <path> <args...>` to completion
/// and return its captured output. Used for invocations that are expected
/// to exit on their own (config errors, `status`, `stop`, `restart`).
pub struct Finished {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

pub fn run(project: &TestProject, args: &[&str]) -> Finished {
    let output = AssertCommand::cargo_bin("procwave")
        .expect("procwave binary is built")
        .arg("--config")
        .arg(project.path().join("procwave.toml"))
        .arg("--socket")
        .arg(project.socket_path())
        .args(args)
        .output()
        .expect("run procwave");
    Finished {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

/// A `procwave start` running in the foreground, owning the engine for the
/// lifetime of this handle. Dropping it without calling [`Self::stop`]
/// force-kills the child so a failing assertion never leaks a process.
pub struct RunningEngine {
    child: Option<Child>,
}

impl RunningEngine {
    /// Spawn `procwave start` and block until its "is up" banner appears on
    /// stdout (or `timeout` elapses, in which case the test fails loudly
    /// rather than hanging).
    pub fn spawn(project: &TestProject) -> Self {
        let mut child = Command::new(bin_path())
            .arg("--config")
            .arg(project.path().join("procwave.toml"))
            .arg("--socket")
            .arg(project.socket_path())
            .arg("start")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn procwave start");

        let stdout = child.stdout.take().expect("piped stdout");
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let matched = line.contains("is up");
                        let _ = tx.send(line.clone());
                        if matched {
                            break;
                        }
                    }
                }
            }
        });

        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(line) if line.contains("is up") => break,
                Ok(_) => continue,
                Err(_) => panic!("procwave start never printed its ready banner"),
            }
        }

        Self { child: Some(child) }
    }

    /// Send SIGTERM and wait for the foreground process to exit, returning
    /// its exit status. Mirrors the CLI's own signal-triggered shutdown
    /// path (section 6: "0 on clean shutdown").
    pub fn stop(mut self) -> std::process::ExitStatus {
        let mut child = self.child.take().expect("engine still running");
        let pid = nix::unistd::Pid::from_raw(child.id() as i32);
        let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM);
        child.wait().expect("wait for procwave start to exit")
    }
}

impl Drop for RunningEngine {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Connect to an already-bound control socket and read newline-delimited
/// JSON lines from it, ignoring the replay guarantees (section 4.7: a new
/// connection receives nothing until the next broadcast).
pub struct SocketClient {
    stream: UnixStream,
}

impl SocketClient {
    pub fn connect(project: &TestProject) -> Self {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match UnixStream::connect(project.socket_path()) {
                Ok(stream) => return Self { stream },
                Err(_) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(err) => panic!("could not connect to control socket: {err}"),
            }
        }
    }

    pub fn send_line(&mut self, json: &str) {
        self.stream.write_all(json.as_bytes()).expect("write to control socket");
        self.stream.write_all(b"\n").expect("write newline");
    }

    /// Read one newline-delimited JSON line, waiting up to 5 seconds.
    pub fn read_line(&mut self) -> serde_json::Value {
        self.stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.stream.read(&mut byte) {
                Ok(0) => panic!("control socket closed before a line arrived"),
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    buf.push(byte[0]);
                }
                Err(err) => panic!("reading control socket: {err}"),
            }
        }
        serde_json::from_slice(&buf).expect("line is valid JSON")
    }

    /// Read lines until one matches `predicate`, or give up after
    /// `attempts` lines.
    pub fn read_until(
        &mut self,
        attempts: usize,
        predicate: impl Fn(&serde_json::Value) -> bool,
    ) -> serde_json::Value {
        for _ in 0..attempts {
            let value = self.read_line();
            if predicate(&value) {
                return value;
            }
        }
        panic!("did not observe a matching line within {attempts} reads");
    }
}
