//! Wire protocol for Bingo Hall.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`Command`], [`Reply`], [`RoomEvent`], and the
//!   snapshot structs): the message structures that travel on the wire.
//! - **Patterns** ([`Pattern`]): the fixed catalog of winning shapes.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session (player) → Room (engine)
//! ```
//!
//! The room engine returns the snapshot types defined here, so a snapshot
//! can be answered to a polling client or pushed to observers unchanged.

mod codec;
mod error;
mod pattern;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use pattern::{Cell, Pattern, CARD_CELLS, GRID_SIZE};
pub use types::{
    CallOutcome, CardView, ClaimOutcome, Command, Envelope, GameSnapshot,
    Payload, PlayerId, Rejection, Reply, RoomEvent, RoomId, RoomListEntry,
    RoomSnapshot, RoomStatus, SystemMessage,
};
