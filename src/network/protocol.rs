//! Event Protocol
//!
//! Wire format for the match notification feed. The server streams
//! `data: <json>\n` lines over a long-lived HTTP response; each payload is
//! `{ "type": <EventType>, "payload": { ... } }`.
//!
//! Chunk boundaries do not line up with frames, so [`FrameDecoder`] buffers
//! the trailing partial line (as bytes, so split UTF-8 sequences survive)
//! until its newline arrives.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::game::state::{Role, Winner};

/// Prefix of a data line.
pub const DATA_PREFIX: &str = "data: ";

/// Longest line the decoder buffers while waiting for its newline.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Protocol errors. Never fatal to a stream: the frame is dropped.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Line is not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
    /// Line grew past the limit without a newline; the rest of it is skipped.
    #[error("frame exceeds {limit} bytes")]
    LineTooLong {
        /// Configured limit.
        limit: usize,
    },
    /// Payload is not a known event.
    #[error("malformed event payload: {0}")]
    Json(#[from] serde_json::Error),
    /// Response body could not be decoded.
    #[error("malformed response body: {0}")]
    Body(String),
}

// =============================================================================
// EVENTS
// =============================================================================

/// Fixed event vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Player 1 joined.
    #[serde(rename = "PLAYER1_JOIN")]
    Player1Join,
    /// Player 2 joined.
    #[serde(rename = "PLAYER2_JOIN")]
    Player2Join,
    /// A new turn opened.
    #[serde(rename = "NEW_TURN")]
    NewTurn,
    /// Player 1 recorded a move.
    #[serde(rename = "PLAYER1_MOVED")]
    Player1Moved,
    /// Player 2 recorded a move.
    #[serde(rename = "PLAYER2_MOVED")]
    Player2Moved,
    /// A turn resolved; payload names the next turn.
    #[serde(rename = "TURN_ENDED")]
    TurnEnded,
    /// Match over.
    #[serde(rename = "MATCH_ENDED")]
    MatchEnded,
}

impl EventType {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Player1Join => "PLAYER1_JOIN",
            EventType::Player2Join => "PLAYER2_JOIN",
            EventType::NewTurn => "NEW_TURN",
            EventType::Player1Moved => "PLAYER1_MOVED",
            EventType::Player2Moved => "PLAYER2_MOVED",
            EventType::TurnEnded => "TURN_ENDED",
            EventType::MatchEnded => "MATCH_ENDED",
        }
    }
}

/// A decoded notification. Hints only; the snapshot stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// A seat was filled.
    PlayerJoined(Role),
    /// A turn opened.
    NewTurn {
        /// Index of the new turn.
        turn_id: usize,
    },
    /// A seat recorded its move for the current turn.
    PlayerMoved(Role),
    /// A turn resolved.
    TurnEnded {
        /// Index of the turn that follows.
        new_turn_id: usize,
    },
    /// The match is over.
    MatchEnded {
        /// Final result.
        winner: Winner,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: EventType,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewTurnPayload {
    turn_id: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TurnEndedPayload {
    new_turn_id: usize,
}

#[derive(Deserialize)]
struct MatchEndedPayload {
    winner: Winner,
}

impl MatchEvent {
    /// Event type tag.
    pub fn event_type(&self) -> EventType {
        match self {
            MatchEvent::PlayerJoined(Role::Player1) => EventType::Player1Join,
            MatchEvent::PlayerJoined(Role::Player2) => EventType::Player2Join,
            MatchEvent::NewTurn { .. } => EventType::NewTurn,
            MatchEvent::PlayerMoved(Role::Player1) => EventType::Player1Moved,
            MatchEvent::PlayerMoved(Role::Player2) => EventType::Player2Moved,
            MatchEvent::TurnEnded { .. } => EventType::TurnEnded,
            MatchEvent::MatchEnded { .. } => EventType::MatchEnded,
        }
    }

    /// Deserialize from a JSON payload.
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(s)?;
        let event = match envelope.kind {
            EventType::Player1Join => MatchEvent::PlayerJoined(Role::Player1),
            EventType::Player2Join => MatchEvent::PlayerJoined(Role::Player2),
            EventType::Player1Moved => MatchEvent::PlayerMoved(Role::Player1),
            EventType::Player2Moved => MatchEvent::PlayerMoved(Role::Player2),
            EventType::NewTurn => {
                let p: NewTurnPayload = serde_json::from_value(envelope.payload)?;
                MatchEvent::NewTurn { turn_id: p.turn_id }
            }
            EventType::TurnEnded => {
                let p: TurnEndedPayload = serde_json::from_value(envelope.payload)?;
                MatchEvent::TurnEnded { new_turn_id: p.new_turn_id }
            }
            EventType::MatchEnded => {
                let p: MatchEndedPayload = serde_json::from_value(envelope.payload)?;
                MatchEvent::MatchEnded { winner: p.winner }
            }
        };
        Ok(event)
    }

    /// Serialize to the JSON payload.
    pub fn to_json(&self) -> String {
        let payload = match self {
            MatchEvent::PlayerJoined(_) | MatchEvent::PlayerMoved(_) => json!({}),
            MatchEvent::NewTurn { turn_id } => json!({ "turnId": turn_id }),
            MatchEvent::TurnEnded { new_turn_id } => json!({ "newTurnId": new_turn_id }),
            MatchEvent::MatchEnded { winner } => json!({ "winner": winner }),
        };
        json!({ "type": self.event_type(), "payload": payload }).to_string()
    }

    /// Serialize as one complete data line.
    pub fn to_frame(&self) -> String {
        format!("{}{}\n", DATA_PREFIX, self.to_json())
    }
}

// =============================================================================
// FRAME DECODER
// =============================================================================

/// Incremental line decoder for the event stream body.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_line: usize,
    /// Inside an oversized line; drop bytes until its newline.
    skipping: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_LEN)
    }
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with a custom line limit.
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line: max_line.max(1),
            skipping: false,
        }
    }

    /// Feed one chunk and decode every line it completes.
    ///
    /// Non-data lines (comments, `event:` fields, keep-alive blanks) produce
    /// nothing. A partial line longer than the limit is dropped and reported
    /// once as [`ProtocolError::LineTooLong`].
    pub fn push(&mut self, mut chunk: &[u8]) -> Vec<Result<MatchEvent, ProtocolError>> {
        if self.skipping {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.skipping = false;
                    chunk = &chunk[end + 1..];
                }
                None => return Vec::new(),
            }
        }
        self.buffer.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        if let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') {
            let complete: Vec<u8> = self.buffer.drain(..=last_newline).collect();
            decoded.extend(complete.split(|b| *b == b'\n').filter_map(decode_line));
        }

        if self.buffer.len() > self.max_line {
            self.buffer.clear();
            self.skipping = true;
            decoded.push(Err(ProtocolError::LineTooLong { limit: self.max_line }));
        }
        decoded
    }

    /// Bytes held for an incomplete line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Discard any partial line (on reconnect).
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.skipping = false;
    }
}

fn decode_line(line: &[u8]) -> Option<Result<MatchEvent, ProtocolError>> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let data = line.strip_prefix(DATA_PREFIX.as_bytes())?;
    Some(
        std::str::from_utf8(data)
            .map_err(|_| ProtocolError::InvalidUtf8)
            .and_then(MatchEvent::from_json),
    )
}
