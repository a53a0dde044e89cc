//! Unified error type for the Bingo Hall server.

use bingo_protocol::ProtocolError;
use bingo_room::{ConfigError, RoomError};
use bingo_session::SessionError;
use bingo_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates `From` impls, so the
/// `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BingoError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad handshake).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, duplicate connection, capacity).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error that escaped a request.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The server can't start with this configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: BingoError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, BingoError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_session_error() {
        let err: BingoError = SessionError::AuthFailed("nope".into()).into();
        assert!(matches!(err, BingoError::Session(_)));
    }

    #[test]
    fn test_from_config_error() {
        let err: BingoError = ConfigError::WordBankTooSmall {
            size: 10,
            required: 25,
        }
        .into();
        assert!(matches!(err, BingoError::Config(_)));
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
