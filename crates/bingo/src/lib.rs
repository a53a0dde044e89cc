//! # Bingo Hall
//!
//! Multiplayer word-bingo over WebSockets.
//!
//! Players open or join rooms, a countdown (or the host) starts a round,
//! words are called one at a time, and the first valid claim against the
//! round's pattern wins. Every room is a single Tokio task, so concurrent
//! joins, starts and claims against one room are applied in order and
//! exactly one of each racing pair takes effect.
//!
//! The crate wires the layers together:
//!
//! - `bingo-transport`: WebSocket listener and connections
//! - `bingo-protocol`: the JSON envelope, commands, replies and events
//! - `bingo-session`: authentication and one session per player
//! - `bingo-room`: rooms, cards, rounds and the room registry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingo::prelude::*;
//!
//! struct TokenAuth;
//!
//! impl Authenticator for TokenAuth {
//!     async fn authenticate(&self, token: &str) -> Result<PlayerId, SessionError> {
//!         token
//!             .parse()
//!             .map(PlayerId)
//!             .map_err(|_| SessionError::AuthFailed("token must be a number".into()))
//!     }
//! }
//!
//! # async fn start() -> Result<(), BingoError> {
//! let server = BingoServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(TokenAuth)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::BingoError;
pub use server::{BingoServer, BingoServerBuilder, PROTOCOL_VERSION};

/// Everything a server binary or a test client usually needs.
pub mod prelude {
    pub use crate::{BingoError, BingoServer, BingoServerBuilder, PROTOCOL_VERSION};
    pub use bingo_protocol::{
        CallOutcome, CardView, ClaimOutcome, Codec, Command, Envelope, GameSnapshot, JsonCodec,
        Pattern, Payload, PlayerId, Rejection, Reply, RoomEvent, RoomId, RoomListEntry,
        RoomSnapshot, RoomStatus, SystemMessage,
    };
    pub use bingo_room::{RoomConfig, RoomError, RoomRegistry, WordBank};
    pub use bingo_session::{Authenticator, SessionConfig, SessionError};
}
