// SPDX-License-Identifier: MIT

//! A thin client over the control socket (section 4.7): used by every CLI
//! subcommand except `start` itself, which owns the engine in-process.
//! `procwave start` is the one process that holds the full
//! [`procwave_orchestrator::Orchestrator`]; every other invocation is a new
//! process that dials in, sends or waits for one wire record, and exits.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use procwave_broadcast::{CommandAction, WireMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Send one `command` record and wait for the matching `command_response`.
pub async fn send_command(socket_path: &Path, action: CommandAction, process_name: String) -> Result<()> {
    let stream = connect(socket_path).await?;
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    let msg = WireMessage::Command { action, process_name };
    write.write_all(msg.to_line()?.as_bytes()).await.context("writing command")?;

    let line = read_line(&mut reader).await?;
    match line {
        WireMessage::CommandResponse { success: true, message, .. } => {
            println!("{message}");
            Ok(())
        }
        WireMessage::CommandResponse { success: false, message, .. } => Err(anyhow!("{message}")),
        other => Err(anyhow!("unexpected reply from engine: {other:?}")),
    }
}

/// Connect and wait for the next `status_update` broadcast from a running
/// engine. The server replays nothing to new connections (section 4.7), so
/// this blocks until the aggregator's next periodic tick.
pub async fn fetch_status(socket_path: &Path) -> Result<WireMessage> {
    let stream = connect(socket_path).await?;
    let (read, _write) = stream.into_split();
    let mut reader = BufReader::new(read);

    loop {
        match read_line(&mut reader).await? {
            msg @ WireMessage::StatusUpdate { .. } => return Ok(msg),
            WireMessage::Log { .. } | WireMessage::Command { .. } | WireMessage::CommandResponse { .. } => continue,
        }
    }
}

async fn connect(socket_path: &Path) -> Result<UnixStream> {
    UnixStream::connect(socket_path).await.with_context(|| {
        format!(
            "could not connect to {} — is `procwave start` running for this project?",
            socket_path.display()
        )
    })
}

async fn read_line(reader: &mut BufReader<tokio::net::unix::OwnedReadHalf>) -> Result<WireMessage> {
    let mut line = String::new();
    let read = tokio::time::timeout(COMMAND_TIMEOUT, reader.read_line(&mut line))
        .await
        .context("timed out waiting for the engine to reply")?
        .context("reading from control socket")?;
    if read == 0 {
        return Err(anyhow!("engine closed the connection without replying"));
    }
    serde_json::from_str(line.trim_end()).context("malformed reply from engine")
}
