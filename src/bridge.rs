//! Host bridge — JSON lines in, JSON lines out
//!
//! Reads `InboundMessage`s from the host, routes them to the running orb, and
//! writes `OutboundMessage`s back. Cursor moves only update the tracked
//! position; their pulses arrive later through the orb's broadcast channel and
//! are interleaved with replies on the same writer.

use orbmind_cognition::{Synthesis, VerbalCommand};
use orbmind_core::{InboundMessage, OutboundMessage, Result, Stimulus};
use orbmind_runtime::{OrbHandle, OrbOutput};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Replies to one inbound line, plus whether the host asked to shut down.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub replies: Vec<OutboundMessage>,
    pub shutdown: bool,
}

impl Dispatch {
    fn reply(message: OutboundMessage) -> Self {
        Self {
            replies: vec![message],
            shutdown: false,
        }
    }
}

pub struct Bridge {
    orb: OrbHandle,
    orb_id: String,
}

impl Bridge {
    pub fn new(orb: OrbHandle) -> Self {
        Self {
            orb,
            orb_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn orb_id(&self) -> &str {
        &self.orb_id
    }

    pub fn orb(&self) -> &OrbHandle {
        &self.orb
    }

    pub fn ready(&self) -> OutboundMessage {
        OutboundMessage::Ready {
            orb_id: self.orb_id.clone(),
        }
    }

    /// Handle one protocol line.
    pub async fn dispatch(&mut self, line: &str) -> Dispatch {
        let message = match InboundMessage::parse(line) {
            Ok(m) => m,
            Err(e) => {
                warn!("Unreadable bridge message: {}", e);
                return Dispatch::reply(OutboundMessage::error(format!("invalid message: {}", e)));
            }
        };

        match message {
            InboundMessage::CursorMove { x, y } => {
                let sample = self.orb.update_cursor(x, y);
                debug!("Cursor at ({}, {}) v={:.2}", x, y, sample.velocity);
                Dispatch::default()
            }

            InboundMessage::Query { text } => Dispatch::reply(self.query(text).await),

            InboundMessage::Speech { text } => Dispatch {
                replies: self.speech(text).await,
                shutdown: false,
            },

            InboundMessage::GetStatus => match self.orb.status().await {
                Ok(status) => Dispatch::reply(OutboundMessage::StatusResponse {
                    data: to_value(&status),
                }),
                Err(e) => Dispatch::reply(OutboundMessage::error(e.to_string())),
            },

            InboundMessage::Purge => match self.orb.purge().await {
                Ok(purged) => Dispatch::reply(OutboundMessage::PurgeResult { purged }),
                Err(e) => Dispatch::reply(OutboundMessage::error(e.to_string())),
            },

            InboundMessage::Shutdown => {
                info!("Bridge: shutdown requested");
                self.orb.stop().await;
                Dispatch {
                    replies: vec![OutboundMessage::ShutdownAck],
                    shutdown: true,
                }
            }
        }
    }

    async fn query(&self, text: String) -> OutboundMessage {
        let result = match self.orb.submit(Stimulus::text(text.clone())).await {
            Ok(result) => result,
            Err(e) => return OutboundMessage::error(e.to_string()),
        };
        let state = self.orb.status().await.ok();
        OutboundMessage::QueryResult {
            data: json!({
                "echo": text,
                "response_text": format!("Analyzed: {}", text),
                "cognitive_result": result.as_ref().map(pulse_value),
                "state": state,
            }),
        }
    }

    async fn speech(&self, transcription: String) -> Vec<OutboundMessage> {
        let mut replies = Vec::new();
        if let Some(command) = VerbalCommand::parse(&transcription) {
            info!("Verbal command: {}", command.name());
            replies.push(command.to_message());
        }
        match self.orb.submit(Stimulus::speech(transcription.clone())).await {
            Ok(Some(synthesis)) => replies.push(OutboundMessage::SpeechPulse {
                data: pulse_value(&synthesis),
                transcription,
            }),
            Ok(None) => debug!("Speech stimulus produced no pulse"),
            Err(e) => replies.push(OutboundMessage::error(e.to_string())),
        }
        replies
    }

    /// Serve the protocol until the host shuts down or closes its input.
    pub async fn run<R, W>(mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let mut outputs = self.orb.subscribe();
        write_line(&mut writer, &self.ready()).await?;
        info!("Bridge ready (orb {})", self.orb_id);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Bridge: host input closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let dispatch = self.dispatch(&line).await;
                    for reply in &dispatch.replies {
                        write_line(&mut writer, reply).await?;
                    }
                    if dispatch.shutdown {
                        return Ok(());
                    }
                }
                output = outputs.recv() => match output {
                    Ok(output) => {
                        if let Some(message) = pulse_message(&output) {
                            write_line(&mut writer, &message).await?;
                        }
                    }
                    Err(RecvError::Lagged(n)) => warn!("Bridge lagged, {} pulses dropped", n),
                    Err(RecvError::Closed) => break,
                },
            }
        }
        self.orb.stop().await;
        Ok(())
    }
}

/// Outbound message for a broadcast orb output, if it has one.
pub fn pulse_message(output: &OrbOutput) -> Option<OutboundMessage> {
    match output {
        OrbOutput::Pulse { synthesis, .. } => Some(OutboundMessage::CognitivePulse {
            data: pulse_value(synthesis),
        }),
        OrbOutput::Rejected { .. } | OrbOutput::Stopped => None,
    }
}

fn pulse_value(synthesis: &Synthesis) -> Value {
    to_value(&synthesis.pulse())
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, message: &OutboundMessage) -> Result<()> {
    writer.write_all(message.to_line().as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
