//! `BingoServer` builder and server loop.
//!
//! This is the entry point for running a bingo server. It ties together
//! all the layers: transport → protocol → session → room.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bingo_protocol::{Codec, JsonCodec};
use bingo_room::{RoomConfig, RoomRegistry, WordBank};
use bingo_session::{Authenticator, SessionConfig, SessionManager};
use bingo_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::BingoError;
use crate::handler::handle_connection;

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shortest gap between two idle-room sweeps.
const MIN_REAP_PERIOD: Duration = Duration::from_secs(1);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: RoomRegistry,
    pub(crate) auth: A,
    pub(crate) codec: C,
    /// How long a connection may stay silent before it is dropped.
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a bingo server.
///
/// # Example
///
/// ```rust,ignore
/// let server = BingoServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig { wait_window: Duration::from_secs(10), ..Default::default() })
///     .build(my_auth)
///     .await?;
/// server.run().await
/// ```
pub struct BingoServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    words: Option<Vec<String>>,
    session_config: SessionConfig,
    idle_timeout: Duration,
}

impl BingoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            words: None,
            session_config: SessionConfig::default(),
            idle_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Replaces the built-in vocabulary. Checked by [`build`](Self::build).
    pub fn words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words = Some(words.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Validates the configuration, binds the listener, and returns a
    /// server ready to [`run`](BingoServer::run).
    ///
    /// # Errors
    /// - [`BingoError::Config`] if the word bank has fewer than 25
    ///   distinct words.
    /// - [`BingoError::Transport`] if the address can't be bound.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<BingoServer<A, JsonCodec>, BingoError> {
        let bank = match self.words {
            Some(words) => WordBank::new(words)?,
            None => WordBank::standard(),
        };
        tracing::info!(words = bank.len(), "word bank loaded");

        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            rooms: RoomRegistry::new(bank, self.room_config),
            auth,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(BingoServer { transport, state })
    }
}

impl Default for BingoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bingo server bound to its address.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BingoServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
}

impl<A, C> BingoServer<A, C>
where
    A: Authenticator,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The rooms this server hosts.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.state.rooms
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Idle rooms are reaped in the background. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), BingoError> {
        tracing::info!(addr = ?self.local_addr().ok(), "bingo server running");

        if let Some(ttl) = self.state.rooms.config().idle_ttl {
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let mut every = tokio::time::interval(ttl.max(MIN_REAP_PERIOD));
                loop {
                    every.tick().await;
                    state.rooms.reap_idle().await;
                }
            });
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
