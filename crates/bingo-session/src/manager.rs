//! The session manager: tracks all connected players.
//!
//! # Concurrency note
//!
//! `SessionManager` is not thread-safe by itself. It uses a plain
//! `HashMap` and is shared behind a mutex by the server; no room operation
//! ever runs while that mutex is held.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use bingo_protocol::PlayerId;

use crate::{Session, SessionConfig, SessionError};

/// Manages all live player sessions.
///
/// ```text
/// authenticate() ──→ create() ──→ disconnect()
/// ```
pub struct SessionManager {
    /// Live sessions, keyed by player ID. One per player.
    sessions: HashMap<PlayerId, Session>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    /// Registers a session for a player after successful authentication.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyConnected`] if the player is already
    ///   connected.
    /// - [`SessionError::CapacityReached`] if `max_sessions` is reached.
    pub fn create(&mut self, player_id: PlayerId) -> Result<&Session, SessionError> {
        let limit = self.config.max_sessions;
        if limit > 0 && self.sessions.len() >= limit && !self.sessions.contains_key(&player_id) {
            return Err(SessionError::CapacityReached(limit));
        }

        match self.sessions.entry(player_id) {
            Entry::Occupied(_) => Err(SessionError::AlreadyConnected(player_id)),
            Entry::Vacant(slot) => {
                tracing::info!(%player_id, "session created");
                Ok(slot.insert(Session::new(player_id)))
            }
        }
    }

    /// Removes a player's session. Their room memberships are untouched.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;

        tracing::info!(
            %player_id,
            connected_secs = session.connected_at.elapsed().as_secs(),
            "session closed"
        );
        Ok(session)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    #[test]
    fn test_create_new_player() {
        let mut mgr = SessionManager::default();
        let session = mgr.create(pid(1)).unwrap();
        assert_eq!(session.player_id, pid(1));
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_create_already_connected_returns_error() {
        let mut mgr = SessionManager::default();
        mgr.create(pid(1)).unwrap();
        let err = mgr.create(pid(1)).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyConnected(p) if p == pid(1)));
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_create_respects_capacity() {
        let mut mgr = SessionManager::new(SessionConfig { max_sessions: 2 });
        mgr.create(pid(1)).unwrap();
        mgr.create(pid(2)).unwrap();
        assert!(matches!(
            mgr.create(pid(3)),
            Err(SessionError::CapacityReached(2))
        ));
        // A duplicate still reports the more useful error.
        assert!(matches!(
            mgr.create(pid(1)),
            Err(SessionError::AlreadyConnected(_))
        ));

        mgr.disconnect(pid(1)).unwrap();
        assert!(mgr.create(pid(3)).is_ok());
    }

    #[test]
    fn test_disconnect_removes_session() {
        let mut mgr = SessionManager::default();
        mgr.create(pid(1)).unwrap();

        let closed = mgr.disconnect(pid(1)).unwrap();
        assert_eq!(closed.player_id, pid(1));
        assert!(mgr.is_empty());

        // Reconnecting is just a fresh session.
        assert!(mgr.create(pid(1)).is_ok());
    }

    #[test]
    fn test_disconnect_unknown_player_returns_not_found() {
        let mut mgr = SessionManager::default();
        assert!(matches!(
            mgr.disconnect(pid(9)),
            Err(SessionError::NotFound(_))
        ));
    }
}
