//! Scenario 6 (section 8), command half: a `restart` command produces
//! exactly one `command_response` on the socket that sent it.

use crate::support::{RunningEngine, SocketClient, TestProject};

fn config() -> &'static str {
    r#"
project = "command-roundtrip"

[boot]
use_multiplexer = false
status_tick_interval = "30ms"

[processes.w]
command = "sleep 30"
"#
}

#[test]
fn restart_command_gets_exactly_one_response_on_the_originating_socket() {
    let project = TestProject::new();
    project.write_config(config());
    let engine = RunningEngine::spawn(&project);

    let mut client = SocketClient::connect(&project);
    client.send_line(r#"{"type":"command","action":"restart","process_name":"w"}"#);

    let response = client.read_until(50, |v| v["type"] == "command_response");
    assert_eq!(response["success"], true, "restart of a known process should succeed: {response}");

    engine.stop();
}
