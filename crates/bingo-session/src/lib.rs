//! Player session management for Bingo Hall.
//!
//! This crate handles the lifecycle of player connections:
//!
//! 1. **Authentication**: validating who a player is ([`Authenticator`] trait)
//! 2. **Session tracking**: knowing who's connected ([`SessionManager`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← one session per handshaken connection
//!     ↕
//! Session Layer (this crate)  ← player identity and connection state
//!     ↕
//! Protocol Layer (below)  ← provides PlayerId
//! ```

mod auth;
mod error;
mod manager;
mod session;

pub use auth::Authenticator;
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig};
