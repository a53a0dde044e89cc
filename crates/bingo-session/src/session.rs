//! Session types: the server's record of a connected player.

use std::time::Instant;

use bingo_protocol::PlayerId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Limits for the session layer.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Most concurrent sessions the server accepts. `0` means no limit.
    pub max_sessions: usize,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single player's live connection.
///
/// Created after a successful handshake and removed when the connection
/// closes. Removing a session never touches room state: a player who
/// disconnects stays on the roster of any room they joined.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,

    /// When the handshake completed.
    pub connected_at: Instant,
}

impl Session {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            connected_at: Instant::now(),
        }
    }
}
