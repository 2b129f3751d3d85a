// SPDX-License-Identifier: MIT

//! The control-socket accept loop and per-client connection handling
//! (section 4.7).

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use procwave_core::define_id;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::BroadcastError;
use crate::wire::{CommandAction, WireMessage};

define_id! {
    /// Identifier for one connected control-socket client (section 3 IPCClient).
    pub struct ClientId("clnt");
}

/// Capacity of the server-wide broadcast channel feeding every client's
/// `status_update`/`log` stream. Generous enough that a slow subscriber
/// lags rather than blocking the publisher (section 4.6/4.7: snapshots are
/// replaceable).
pub const BROADCAST_CHANNEL_CAPACITY: usize = 256;

/// Depth of a single client's outbound line queue (broadcast forwards plus
/// its own command responses share this queue so writes never interleave
/// mid-line).
const CLIENT_OUTBOX_CAPACITY: usize = 64;

/// A write that doesn't complete within this window is treated as a dead
/// or too-slow client and the connection is dropped (section 4.7:
/// "non-blocking writes ... dropping on write error and letting it
/// reconnect is acceptable").
const CLIENT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of dispatching one `command` record to the orchestrator.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl CommandOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), data: None }
    }
}

/// What the Broadcast Server calls to route a `command` record (section
/// 4.7: "Commands are dispatched to the Orchestrator; the Orchestrator must
/// call the response sender exactly once per command"). The trait shape
/// enforces that by returning the single response value directly, rather
/// than handing the implementer a response-sender callback to (mis)use.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle_command(&self, action: CommandAction, process_name: String) -> CommandOutcome;
}

/// The local control-socket server: removes any stale socket at bind time,
/// accepts connections independently, and fans `status_update`/`log`
/// records out to every connected client in emission order.
pub struct BroadcastServer {
    listener: UnixListener,
    socket_path: PathBuf,
    broadcast_tx: broadcast::Sender<WireMessage>,
    clients: Arc<AtomicUsize>,
}

impl BroadcastServer {
    /// Bind the control socket at `socket_path`, removing any stale socket
    /// file left behind by a prior run (section 4.7: "On startup it removes
    /// any stale socket file at that path").
    pub fn bind(socket_path: impl Into<PathBuf>) -> Result<Self, BroadcastError> {
        let socket_path = socket_path.into();

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| BroadcastError::CreateDir { path: parent.to_path_buf(), source })?;
        }

        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .map_err(|source| BroadcastError::RemoveStale { path: socket_path.clone(), source })?;
        }

        let listener = UnixListener::bind(&socket_path)
            .map_err(|source| BroadcastError::Bind { path: socket_path.clone(), source })?;
        let (broadcast_tx, _rx) = broadcast::channel(BROADCAST_CHANNEL_CAPACITY);

        Ok(Self { listener, socket_path, broadcast_tx, clients: Arc::new(AtomicUsize::new(0)) })
    }

    /// A sender clone for publishing `status_update`/`log` records. The
    /// caller (the orchestrator, bridging the status aggregator and
    /// per-process log events) owns publication; the server itself never
    /// originates one of these records.
    pub fn sender(&self) -> broadcast::Sender<WireMessage> {
        self.broadcast_tx.clone()
    }

    pub fn socket_path(&self) -> &std::path::Path {
        &self.socket_path
    }

    pub fn connected_clients(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    /// Accept connections until `cancel` fires, then unlink the socket file
    /// (section 5: "The socket-file path is acquired exclusively at server
    /// start and released at server stop; re-binding is permitted only
    /// after unlink").
    pub async fn run(self, handler: Arc<dyn CommandHandler>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        let client_id = ClientId::new();
                        let rx = self.broadcast_tx.subscribe();
                        let handler = handler.clone();
                        let clients = self.clients.clone();
                        tokio::spawn(handle_client(client_id, stream, rx, handler, clients));
                    }
                    Err(err) => tracing::error!(error = %err, "control socket accept error"),
                },
            }
        }

        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Serve one connected client for its lifetime: forward broadcast records,
/// read and dispatch `command` lines, and tear down cleanly on either
/// direction closing (section 4.7 per-client guarantees).
async fn handle_client(
    client_id: ClientId,
    stream: UnixStream,
    mut broadcast_rx: broadcast::Receiver<WireMessage>,
    handler: Arc<dyn CommandHandler>,
    clients: Arc<AtomicUsize>,
) {
    clients.fetch_add(1, Ordering::SeqCst);
    let (reader, mut writer) = stream.into_split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(CLIENT_OUTBOX_CAPACITY);

    let writer_task = tokio::spawn(async move {
        while let Some(line) = out_rx.recv().await {
            let write = writer.write_all(line.as_bytes());
            match tokio::time::timeout(CLIENT_WRITE_TIMEOUT, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::debug!(client = %client_id, error = %err, "client write error");
                    break;
                }
                Err(_) => {
                    tracing::debug!(client = %client_id, "client write timed out, dropping");
                    break;
                }
            }
        }
    });

    let forward_tx = out_tx.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(msg) => {
                    let Ok(line) = msg.to_line() else { continue };
                    if forward_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                dispatch_line(&line, &handler, &out_tx).await;
            }
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(client = %client_id, error = %err, "client read error");
                break;
            }
        }
    }

    drop(out_tx);
    forward_task.abort();
    let _ = writer_task.await;
    clients.fetch_sub(1, Ordering::SeqCst);
}

async fn dispatch_line(line: &str, handler: &Arc<dyn CommandHandler>, out_tx: &mpsc::Sender<String>) {
    match serde_json::from_str::<WireMessage>(line) {
        Ok(WireMessage::Command { action, process_name }) => {
            let outcome = handler.handle_command(action, process_name).await;
            let response = WireMessage::CommandResponse {
                success: outcome.success,
                message: outcome.message,
                data: outcome.data,
            };
            if let Ok(line) = response.to_line() {
                let _ = out_tx.send(line).await;
            }
        }
        Ok(_) => {
            tracing::warn!("discarding non-command record received from client");
        }
        Err(err) => {
            // Section 4.7: "malformed JSON lines are discarded with a
            // server-side log, not fatal to the connection".
            tracing::warn!(error = %err, line, "discarding malformed line from client");
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
