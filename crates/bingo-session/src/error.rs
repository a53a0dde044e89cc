//! Error types for the session layer.

use bingo_protocol::PlayerId;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Authentication failed: the token was invalid or rejected by the
    /// [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No session exists for the given player.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// The player already has a live connection.
    /// A player can only have one session at a time.
    #[error("player {0} already has an active session")]
    AlreadyConnected(PlayerId),

    /// The server is at its configured session limit.
    #[error("server is full ({0} sessions)")]
    CapacityReached(usize),
}
