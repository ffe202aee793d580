//! Bridge protocol — line-delimited JSON over stdin/stdout
//!
//! Wire format (one JSON object per line):
//!
//! Host → Orb:
//!   { "type": "cursor_move", "x": 500, "y": 300 }
//!   { "type": "query", "text": "Hello world" }
//!   { "type": "speech", "text": "cali slow down" }
//!   { "type": "get_status" }
//!   { "type": "purge" }
//!   { "type": "shutdown" }
//!
//! Orb → Host:
//!   { "type": "ready", "orb_id": "..." }
//!   { "type": "cognitive_pulse", "data": { "cognitive_mode": "GUARD", ... } }
//!   { "type": "query_result", "data": { "echo": "...", ... } }
//!   { "type": "speech_pulse", "data": { ... }, "transcription": "..." }
//!   { "type": "verbal_command", "command": "change_color", "color": "#ff4444" }
//!   { "type": "status_response", "data": { "running": true, ... } }
//!   { "type": "purge_result", "purged": false }
//!   { "type": "shutdown_ack" }
//!   { "type": "error", "message": "..." }

use crate::error::Result;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Host → Orb
// ---------------------------------------------------------------------------

/// Message read from the host, one per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    CursorMove {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Query {
        #[serde(default)]
        text: String,
    },
    Speech {
        #[serde(default)]
        text: String,
    },
    GetStatus,
    Purge,
    Shutdown,
}

impl InboundMessage {
    /// Parse one protocol line. Blank lines are an error, callers skip them first.
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

// ---------------------------------------------------------------------------
// Orb → Host
// ---------------------------------------------------------------------------

/// Message written to the host, one per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Ready {
        orb_id: String,
    },
    CognitivePulse {
        data: serde_json::Value,
    },
    QueryResult {
        data: serde_json::Value,
    },
    SpeechPulse {
        data: serde_json::Value,
        transcription: String,
    },
    VerbalCommand {
        command: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    StatusResponse {
        data: serde_json::Value,
    },
    PurgeResult {
        purged: bool,
    },
    ShutdownAck,
    Error {
        message: String,
    },
}

impl OutboundMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to a single protocol line (no trailing newline).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "message": format!("serialization failed: {}", e) })
                .to_string()
        })
    }
}
