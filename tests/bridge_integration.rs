//! End-to-end bridge tests over in-memory pipes

use orbmind::Bridge;
use orbmind_cognition::{OrbConfig, OrbController};
use orbmind_core::OutboundMessage;
use orbmind_runtime::OrbHandle;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::task::JoinHandle;
use tokio::time::timeout;

struct Host {
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
    task: JoinHandle<orbmind_core::Result<()>>,
}

impl Host {
    fn start() -> Self {
        let mut config = OrbConfig::default();
        config.runtime.tick_ms = 10;
        let orb = OrbHandle::start(OrbController::with_reference_collaborators(config));

        let (input, bridge_in) = tokio::io::duplex(64 * 1024);
        let (bridge_out, output) = tokio::io::duplex(64 * 1024);
        let task = tokio::spawn(Bridge::new(orb).run(bridge_in, bridge_out));
        Self {
            input,
            output: BufReader::new(output).lines(),
            task,
        }
    }

    async fn send(&mut self, line: &str) {
        self.input.write_all(line.as_bytes()).await.unwrap();
        self.input.write_all(b"\n").await.unwrap();
    }

    /// Next message of `kind`, skipping anything else.
    async fn expect(&mut self, kind: &str) -> Value {
        timeout(Duration::from_secs(3), async {
            loop {
                let line = self.output.next_line().await.unwrap().expect("bridge closed");
                let value: Value = serde_json::from_str(&line).unwrap();
                if value["type"] == kind {
                    return value;
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("no {} message within 3s", kind))
    }
}

// ===========================================================================
// Protocol
// ===========================================================================

#[tokio::test]
async fn announces_ready_first() {
    let mut host = Host::start();
    let line = host.output.next_line().await.unwrap().unwrap();
    let ready: OutboundMessage = serde_json::from_str(&line).unwrap();
    match ready {
        OutboundMessage::Ready { orb_id } => assert!(!orb_id.is_empty()),
        other => panic!("expected ready, got {:?}", other),
    }
}

#[tokio::test]
async fn query_returns_cognitive_result() {
    let mut host = Host::start();
    host.send(r#"{"type":"query","text":"hi there"}"#).await;

    let reply = host.expect("query_result").await;
    let data = &reply["data"];
    assert_eq!(data["echo"], "hi there");
    assert_eq!(data["response_text"], "Analyzed: hi there");
    assert!(data["cognitive_result"]["cognitive_mode"].is_string());
    let spatial = &data["cognitive_result"]["spatial_coordinate"];
    assert!(spatial["node_id"].as_str().unwrap().starts_with("NODE_"));
    assert!(spatial["coordinates"].is_array());
    assert!(data["cognitive_result"]["glow_intensity"].as_f64().unwrap() >= 0.85);
    assert_eq!(data["state"]["running"], true);
}

#[tokio::test]
async fn speech_emits_verbal_command_then_pulse() {
    let mut host = Host::start();
    host.send(r#"{"type":"speech","text":"Cali change color to red"}"#).await;

    let command = host.expect("verbal_command").await;
    assert_eq!(command["command"], "change_color");
    assert_eq!(command["color"], "#ff4444");

    let pulse = host.expect("speech_pulse").await;
    assert_eq!(pulse["transcription"], "Cali change color to red");
    assert!(pulse["data"]["final_verdict"].is_string());
}

#[tokio::test]
async fn plain_speech_has_no_command() {
    let mut host = Host::start();
    host.send(r#"{"type":"speech","text":"just thinking aloud"}"#).await;
    host.send(r#"{"type":"get_status"}"#).await;

    // Replies are written in order, so a command would appear before the status.
    timeout(Duration::from_secs(3), async {
        loop {
            let line = host.output.next_line().await.unwrap().unwrap();
            let value: Value = serde_json::from_str(&line).unwrap();
            assert_ne!(value["type"], "verbal_command");
            if value["type"] == "status_response" {
                break;
            }
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn cursor_moves_produce_pulses() {
    let mut host = Host::start();
    host.send(r#"{"type":"cursor_move","x":100,"y":200}"#).await;

    let pulse = host.expect("cognitive_pulse").await;
    let mode = pulse["data"]["cognitive_mode"].as_str().unwrap();
    assert!(mode == "GUARD" || mode == "GUARD_HABIT", "mode {}", mode);
}

#[tokio::test]
async fn status_and_purge() {
    let mut host = Host::start();
    host.send(r#"{"type":"query","text":"count me"}"#).await;
    host.expect("query_result").await;

    host.send(r#"{"type":"get_status"}"#).await;
    let status = host.expect("status_response").await;
    assert_eq!(status["data"]["running"], true);
    assert_eq!(status["data"]["cycles_processed"], 1);

    host.send(r#"{"type":"purge"}"#).await;
    let purge = host.expect("purge_result").await;
    assert_eq!(purge["purged"], false);
}

#[tokio::test]
async fn malformed_lines_get_an_error() {
    let mut host = Host::start();
    host.send("not json").await;
    let err = host.expect("error").await;
    assert!(err["message"].as_str().unwrap().contains("invalid message"));

    host.send(r#"{"type":"teleport"}"#).await;
    host.expect("error").await;
}

#[tokio::test]
async fn shutdown_is_acknowledged() {
    let mut host = Host::start();
    host.send(r#"{"type":"shutdown"}"#).await;
    host.expect("shutdown_ack").await;

    let result = timeout(Duration::from_secs(3), host.task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn closing_input_stops_the_bridge() {
    let host = Host::start();
    drop(host.input);
    let result = timeout(Duration::from_secs(3), host.task).await.unwrap().unwrap();
    assert!(result.is_ok());
}
