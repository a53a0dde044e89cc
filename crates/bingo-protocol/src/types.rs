//! Core protocol types for the Bingo Hall wire format.
//!
//! Everything in this module travels "on the wire": it gets serialized,
//! sent to a client (or from one), and deserialized on the other side.
//! The room engine produces the snapshot types here as plain data, so the
//! same values can be returned to a polling client or pushed to observers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Pattern;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// A newtype over `u64` so a `RoomId` can never be passed where a
/// `PlayerId` is expected. `#[serde(transparent)]` keeps the JSON form a
/// plain number: `PlayerId(42)` becomes `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting ──(countdown / host start)──→ Running ──(bingo / finish)──→ Finished
///    ↑                                                                   │
///    └───────────────────────(revisit: lazy reset)───────────────────────┘
/// ```
///
/// A room never goes from `Running` straight back to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Lobby open, countdown running.
    Waiting,
    /// A round is in progress and words are being called.
    Running,
    /// The round ended, with or without a winner.
    Finished,
}

impl RoomStatus {
    /// The only state reachable from this one.
    pub fn next(self) -> Self {
        match self {
            Self::Waiting => Self::Running,
            Self::Running => Self::Finished,
            Self::Finished => Self::Waiting,
        }
    }

    /// Returns `true` if moving to `target` follows the lifecycle.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Lobby view of a room: who is in it and how long until it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub name: String,
    pub host: Option<PlayerId>,
    pub status: RoomStatus,
    /// Whole seconds left on the countdown, floored and never negative.
    pub remaining_seconds: u64,
    /// Countdown deadline in milliseconds since the Unix epoch.
    pub wait_end_time: u64,
    /// Members in join order.
    pub players: Vec<PlayerId>,
}

/// Game view of a room: what has been called and who won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub room_id: RoomId,
    /// Round number within the room. `0` before the first round starts.
    pub round: u64,
    pub status: RoomStatus,
    pub last_word: Option<String>,
    pub called_words: Vec<String>,
    /// `None` until a round has started.
    pub pattern: Option<Pattern>,
    pub winner: Option<PlayerId>,
}

impl GameSnapshot {
    /// The snapshot served before any round exists.
    pub fn empty(room_id: RoomId, status: RoomStatus) -> Self {
        Self {
            room_id,
            round: 0,
            status,
            last_word: None,
            called_words: Vec::new(),
            pattern: None,
            winner: None,
        }
    }
}

/// Result of asking for the next word.
///
/// `finished` is `true` (and `word` is `None`) once the call order is
/// exhausted. That is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub finished: bool,
    pub word: Option<String>,
    pub called_words: Vec<String>,
}

/// Result of a bingo claim as reported to the claimant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub ok: bool,
    /// The round's winner: the claimant on success, the earlier winner
    /// when the claim lost a race.
    pub winner: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Rejection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClaimOutcome {
    /// A successful claim.
    pub fn won(winner: PlayerId) -> Self {
        Self {
            ok: true,
            winner: Some(winner),
            reason: None,
            error: None,
        }
    }

    /// A rejected claim.
    pub fn rejected(
        reason: Rejection,
        error: impl Into<String>,
        winner: Option<PlayerId>,
    ) -> Self {
        Self {
            ok: false,
            winner,
            reason: Some(reason),
            error: Some(error.into()),
        }
    }
}

/// A player's card as shown to that player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub owner: PlayerId,
    pub room_id: RoomId,
    pub round: u64,
    /// 25 words, row-major.
    pub words: Vec<String>,
}

/// A summary of a joinable room for the lobby list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub name: String,
    pub player_count: usize,
    pub remaining_seconds: u64,
}

// ---------------------------------------------------------------------------
// Rejection: why a command failed
// ---------------------------------------------------------------------------

/// Machine-readable reason a command was refused.
///
/// Each variant mirrors one room error so clients can branch on it without
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    NotHost,
    InvalidState,
    AlreadyWon,
    NoCard,
    PatternNotMet,
    RoomNotFound,
    Unavailable,
    BadRequest,
}

impl Rejection {
    /// HTTP-style status code, for transports that want one.
    pub fn code(self) -> u16 {
        match self {
            Self::NotHost => 403,
            Self::RoomNotFound => 404,
            Self::InvalidState | Self::AlreadyWon => 409,
            Self::NoCard | Self::PatternNotMet | Self::BadRequest => 400,
            Self::Unavailable => 503,
        }
    }
}

// ---------------------------------------------------------------------------
// SystemMessage: connection plumbing
// ---------------------------------------------------------------------------

/// Messages the server uses for the connection itself, not for bingo.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "Heartbeat", "client_time": 5000 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: first message on every connection.
    Handshake {
        version: u32,
        token: Option<String>,
    },

    /// Server → Client: the token was accepted.
    HandshakeAck {
        player_id: PlayerId,
        server_time: u64,
    },

    /// Client → Server: keep-alive.
    Heartbeat { client_time: u64 },

    /// Server → Client: keep-alive reply.
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    /// Either direction: closing the connection.
    Disconnect { reason: String },

    /// Server → Client: a protocol-level failure (bad handshake, garbage
    /// frame). `code` follows HTTP conventions.
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Command: what a client asks a room to do
// ---------------------------------------------------------------------------

/// Client → Server bingo operations.
///
/// The acting player is always the authenticated connection owner, never a
/// field in the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Open a new room hosted by the caller. A blank name gets a default.
    CreateRoom {
        #[serde(default)]
        name: Option<String>,
    },
    /// Enter a room's roster and start observing it.
    JoinRoom { room_id: RoomId },
    /// List rooms still in their lobby.
    ListRooms,
    /// Poll the lobby view. Also fires the countdown start if it is due.
    RoomState { room_id: RoomId },
    /// Host-only early start.
    StartGame { room_id: RoomId },
    /// Poll the game view.
    GameState { room_id: RoomId },
    /// Call the next word.
    CallNext { room_id: RoomId },
    /// Claim a win with the caller's card.
    ClaimBingo { room_id: RoomId },
    /// Abandon the current round.
    FinishGame { room_id: RoomId },
    /// Fetch the caller's card for the current round.
    GetCard { room_id: RoomId },
}

// ---------------------------------------------------------------------------
// Reply: the server's answer to one Command
// ---------------------------------------------------------------------------

/// Server → Client answers. Sent in an envelope whose `reply_to` carries
/// the command's `seq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Reply {
    Room(RoomSnapshot),
    RoomList(Vec<RoomListEntry>),
    Game(GameSnapshot),
    Called(CallOutcome),
    Claim(ClaimOutcome),
    Finished(GameSnapshot),
    Card(CardView),
    /// Any command the room refused. `winner` is set for `AlreadyWon`.
    Rejected {
        reason: Rejection,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<PlayerId>,
    },
}

// ---------------------------------------------------------------------------
// RoomEvent: what observers are told
// ---------------------------------------------------------------------------

/// Pushed to every observer of a room after a state change.
///
/// Each event carries a full snapshot, so a client that missed events
/// catches up from the next one it sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RoomEvent {
    /// Roster or lobby changed (join, reset).
    RoomState(RoomSnapshot),
    /// A round began; the first word is already called.
    GameStarted(GameSnapshot),
    /// A new word was called.
    WordCalled(GameSnapshot),
    /// The round ended, by bingo or by force.
    GameFinished(GameSnapshot),
}

impl RoomEvent {
    /// The room this event is about.
    pub fn room_id(&self) -> RoomId {
        match self {
            Self::RoomState(s) => s.room_id,
            Self::GameStarted(g) | Self::WordCalled(g) | Self::GameFinished(g) => g.room_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload and Envelope
// ---------------------------------------------------------------------------

/// The content of an envelope.
///
/// `#[serde(tag = "type", content = "data")]` produces adjacently tagged
/// JSON: `{ "type": "Command", "data": { "type": "CallNext", "room_id": 3 } }`.
/// The outer tag lets the connection handler route without looking inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    Command(Command),
    Reply(Reply),
    Event(RoomEvent),
}

/// The top-level wire message. Every frame is one `Envelope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender sequence number.
    pub seq: u64,

    /// Milliseconds since the sender's connection started.
    pub timestamp: u64,

    /// For replies: the `seq` of the command being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<u64>,

    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! These pin the JSON shapes browser clients depend on.

    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_room_status_lifecycle() {
        assert!(RoomStatus::Waiting.can_transition_to(RoomStatus::Running));
        assert!(RoomStatus::Running.can_transition_to(RoomStatus::Finished));
        assert!(RoomStatus::Finished.can_transition_to(RoomStatus::Waiting));
        assert!(!RoomStatus::Running.can_transition_to(RoomStatus::Waiting));
        assert!(!RoomStatus::Waiting.can_transition_to(RoomStatus::Finished));
    }

    #[test]
    fn test_room_status_serializes_lowercase() {
        let json = serde_json::to_string(&RoomStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        assert_eq!(RoomStatus::Finished.to_string(), "finished");
    }

    #[test]
    fn test_room_snapshot_json_format() {
        let snap = RoomSnapshot {
            room_id: RoomId(1),
            name: "Friday".into(),
            host: Some(PlayerId(9)),
            status: RoomStatus::Waiting,
            remaining_seconds: 12,
            wait_end_time: 1_700_000_000_000,
            players: vec![PlayerId(9), PlayerId(4)],
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["remaining_seconds"], 12);
        assert_eq!(json["players"], serde_json::json!([9, 4]));
        assert_eq!(json["host"], 9);
    }

    #[test]
    fn test_empty_game_snapshot() {
        let snap = GameSnapshot::empty(RoomId(2), RoomStatus::Waiting);
        let json = serde_json::to_value(&snap).unwrap();
        assert!(json["last_word"].is_null());
        assert!(json["pattern"].is_null());
        assert!(json["winner"].is_null());
        assert_eq!(json["called_words"], serde_json::json!([]));
    }

    #[test]
    fn test_claim_outcome_omits_empty_error() {
        let json = serde_json::to_value(ClaimOutcome::won(PlayerId(5))).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["winner"], 5);
        assert!(json.get("error").is_none());

        let lost = ClaimOutcome::rejected(
            Rejection::AlreadyWon,
            "already won",
            Some(PlayerId(5)),
        );
        let json = serde_json::to_value(lost).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["reason"], "already_won");
        assert_eq!(json["winner"], 5);
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(Rejection::NotHost.code(), 403);
        assert_eq!(Rejection::RoomNotFound.code(), 404);
        assert_eq!(Rejection::AlreadyWon.code(), 409);
        assert_eq!(Rejection::PatternNotMet.code(), 400);
    }

    #[test]
    fn test_command_json_format() {
        let cmd = Command::ClaimBingo { room_id: RoomId(3) };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "ClaimBingo");
        assert_eq!(json["room_id"], 3);
    }

    #[test]
    fn test_create_room_name_is_optional() {
        let cmd: Command = serde_json::from_str(r#"{"type":"CreateRoom"}"#).unwrap();
        assert_eq!(cmd, Command::CreateRoom { name: None });
    }

    #[test]
    fn test_payload_command_json_format() {
        let payload = Payload::Command(Command::ListRooms);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "Command");
        assert_eq!(json["data"]["type"], "ListRooms");
    }

    #[test]
    fn test_event_room_id() {
        let ev = RoomEvent::WordCalled(GameSnapshot::empty(RoomId(8), RoomStatus::Running));
        assert_eq!(ev.room_id(), RoomId(8));
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "WordCalled");
        assert_eq!(json["data"]["room_id"], 8);
    }

    #[test]
    fn test_envelope_reply_to_defaults_when_missing() {
        let json = r#"{
            "seq": 1,
            "timestamp": 100,
            "payload": { "type": "Command", "data": { "type": "ListRooms" } }
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.reply_to, None);
        assert_eq!(envelope.payload, Payload::Command(Command::ListRooms));
    }

    #[test]
    fn test_envelope_round_trip_with_reply() {
        let envelope = Envelope {
            seq: 4,
            timestamp: 250,
            reply_to: Some(3),
            payload: Payload::Reply(Reply::Rejected {
                reason: Rejection::NotHost,
                message: "only the host can start".into(),
                winner: None,
            }),
        };
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn test_decode_unknown_command_returns_error() {
        let unknown = r#"{"type": "StealCard", "room_id": 1}"#;
        let result: Result<Command, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
