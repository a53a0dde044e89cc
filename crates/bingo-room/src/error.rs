//! Error types for the room layer.

use bingo_protocol::{PlayerId, Rejection, RoomId};

/// Errors that can occur during room operations.
///
/// Every variant except `Unavailable` is an expected per-request outcome,
/// reported to the caller and never logged above `debug`.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Only the host may start a room early.
    #[error("player {0} is not the host of room {1}")]
    NotHost(PlayerId, RoomId),

    /// The room is in a state that doesn't allow this operation.
    /// For example, claiming in a room that is still waiting.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The round already has a winner. Carries who won.
    #[error("bingo already won by {0}")]
    AlreadyWon(PlayerId),

    /// The player has no card for the current round.
    #[error("player {0} has no card in this round")]
    NoCard(PlayerId),

    /// The player's card does not satisfy the round's pattern yet.
    #[error("card of player {0} does not match the pattern yet")]
    PatternNotMet(PlayerId),

    /// The room's actor has stopped and its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// The wire-level reason for this error.
    pub fn rejection(&self) -> Rejection {
        match self {
            Self::NotFound(_) => Rejection::RoomNotFound,
            Self::NotHost(..) => Rejection::NotHost,
            Self::InvalidState(_) => Rejection::InvalidState,
            Self::AlreadyWon(_) => Rejection::AlreadyWon,
            Self::NoCard(_) => Rejection::NoCard,
            Self::PatternNotMet(_) => Rejection::PatternNotMet,
            Self::Unavailable(_) => Rejection::Unavailable,
        }
    }

    /// The recorded winner, for errors that carry one.
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            Self::AlreadyWon(winner) => Some(*winner),
            _ => None,
        }
    }
}

/// Configuration that makes the server unable to run at all.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Fewer distinct words than a card has squares.
    #[error("word bank has {size} distinct words, at least {required} are needed")]
    WordBankTooSmall { size: usize, required: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_mapping() {
        assert_eq!(
            RoomError::NotHost(PlayerId(1), RoomId(2)).rejection(),
            Rejection::NotHost
        );
        assert_eq!(
            RoomError::NotFound(RoomId(2)).rejection(),
            Rejection::RoomNotFound
        );
        assert_eq!(
            RoomError::PatternNotMet(PlayerId(1)).rejection(),
            Rejection::PatternNotMet
        );
    }

    #[test]
    fn test_already_won_carries_winner() {
        let err = RoomError::AlreadyWon(PlayerId(7));
        assert_eq!(err.winner(), Some(PlayerId(7)));
        assert!(err.to_string().contains("P-7"));
        assert_eq!(RoomError::NoCard(PlayerId(7)).winner(), None);
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::WordBankTooSmall {
            size: 3,
            required: 25,
        };
        assert!(err.to_string().contains("3 distinct words"));
        assert_eq!(
            RoomError::Unavailable(RoomId(4)).rejection(),
            Rejection::Unavailable
        );
    }
}
