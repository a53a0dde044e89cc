//! Room lifecycle management for Bingo Hall.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! lobby, its current round, and the players' cards.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms, looks them up, lists open lobbies
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Room`]: the waiting → running → finished state machine
//! - [`GameRound`]: call order, called words, pattern, winner
//! - [`Card`] and [`WordBank`]: what players hold and where it comes from
//! - [`RoomConfig`]: countdown length, channel sizes, sweep interval

mod actor;
mod broadcast;
mod card;
mod config;
mod error;
mod registry;
mod room;
mod round;
mod words;

pub use actor::{RoomHandle, RoomInfo};
pub use broadcast::Broadcaster;
pub use card::Card;
pub use config::RoomConfig;
pub use error::{ConfigError, RoomError};
pub use registry::RoomRegistry;
pub use room::Room;
pub use round::GameRound;
pub use words::WordBank;
