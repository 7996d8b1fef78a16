//! Wire protocol for noughts.
//!
//! This crate defines the "language" clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomInfo`],
//!   [`Board`], [`RoomId`], ...): the records that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those records are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! The protocol layer knows nothing about rooms or sockets; it only
//! knows how messages look.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Coordinator (rooms)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    BOARD_CELLS, Board, ClientMessage, Mark, PlayerInfo, Recipient, RoomId, RoomInfo,
    RoomSummary, ServerMessage, SpectatorInfo,
};
