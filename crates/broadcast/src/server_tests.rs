// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio_util::sync::CancellationToken;

use super::*;

struct EchoHandler;

#[async_trait::async_trait]
impl CommandHandler for EchoHandler {
    async fn handle_command(&self, action: CommandAction, process_name: String) -> CommandOutcome {
        CommandOutcome::ok(format!("{action:?} {process_name}"))
    }
}

async fn read_one_line(stream: &mut BufReader<tokio::net::unix::OwnedReadHalf>) -> WireMessage {
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(2), stream.read_line(&mut line))
        .await
        .expect("read timed out")
        .expect("read succeeded");
    serde_json::from_str(line.trim_end()).expect("valid wire message")
}

#[tokio::test]
async fn bind_removes_a_stale_socket_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ctl.sock");
    std::fs::write(&path, b"stale").expect("write stale file");

    let server = BroadcastServer::bind(&path).expect("binds over stale file");
    assert!(path.exists());
    drop(server);
}

#[tokio::test]
async fn late_client_does_not_receive_replayed_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ctl.sock");
    let server = BroadcastServer::bind(&path).expect("binds");
    let sender = server.sender();
    let cancel = CancellationToken::new();
    let server_task = tokio::spawn(server.run(Arc::new(EchoHandler), cancel.clone()));

    for i in 0..3u64 {
        let _ = sender.send(WireMessage::StatusUpdate {
            timestamp: i,
            processes: vec![],
            system_metrics: None,
        });
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    let stream = UnixStream::connect(&path).await.expect("connects");
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    let _ = sender.send(WireMessage::StatusUpdate { timestamp: 100, processes: vec![], system_metrics: None });
    let msg = read_one_line(&mut reader).await;
    match msg {
        WireMessage::StatusUpdate { timestamp, .. } => assert_eq!(timestamp, 100),
        other => panic!("unexpected message: {other:?}"),
    }

    write.shutdown().await.ok();
    cancel.cancel();
    let _ = server_task.await;
}

#[tokio::test]
async fn command_produces_exactly_one_response_to_originating_client() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ctl.sock");
    let server = BroadcastServer::bind(&path).expect("binds");
    let cancel = CancellationToken::new();
    let server_task = tokio::spawn(server.run(Arc::new(EchoHandler), cancel.clone()));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let stream_a = UnixStream::connect(&path).await.expect("client a connects");
    let (read_a, mut write_a) = stream_a.into_split();
    let mut reader_a = BufReader::new(read_a);

    let stream_b = UnixStream::connect(&path).await.expect("client b connects");
    let (read_b, mut write_b) = stream_b.into_split();
    let mut reader_b = BufReader::new(read_b);

    let command = WireMessage::Command { action: CommandAction::Restart, process_name: "api".to_string() };
    write_a.write_all(command.to_line().expect("serializes").as_bytes()).await.expect("write");

    let response = read_one_line(&mut reader_a).await;
    match response {
        WireMessage::CommandResponse { success, .. } => assert!(success),
        other => panic!("expected command_response, got {other:?}"),
    }

    // Client B must not receive the response addressed to client A: confirm
    // there's nothing pending for it within a short window.
    let nothing_for_b = tokio::time::timeout(Duration::from_millis(100), async {
        let mut line = String::new();
        reader_b.read_line(&mut line).await
    })
    .await;
    assert!(nothing_for_b.is_err(), "client b should not have received a response");

    write_a.shutdown().await.ok();
    write_b.shutdown().await.ok();
    cancel.cancel();
    let _ = server_task.await;
}

#[tokio::test]
async fn malformed_line_does_not_close_the_connection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ctl.sock");
    let server = BroadcastServer::bind(&path).expect("binds");
    let cancel = CancellationToken::new();
    let server_task = tokio::spawn(server.run(Arc::new(EchoHandler), cancel.clone()));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let stream = UnixStream::connect(&path).await.expect("connects");
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    write.write_all(b"not json at all\n").await.expect("write garbage");
    let command = WireMessage::Command { action: CommandAction::Stop, process_name: "api".to_string() };
    write.write_all(command.to_line().expect("serializes").as_bytes()).await.expect("write command");

    // The connection survives the malformed line and still answers the
    // well-formed command that follows it.
    let response = read_one_line(&mut reader).await;
    assert!(matches!(response, WireMessage::CommandResponse { success: true, .. }));

    write.shutdown().await.ok();
    cancel.cancel();
    let _ = server_task.await;
}
