//! # noughts
//!
//! Real-time multiplayer tic-tac-toe coordinator.
//!
//! Clients connect over WebSocket and exchange JSON records with a `type`
//! field. The server owns every room: it seats two players and any number
//! of spectators, enforces turn order, validates moves, detects wins and
//! draws, and broadcasts each state change to the whole room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noughts::prelude::*;
//!
//! # async fn start() -> Result<(), NoughtsError> {
//! let server = NoughtsServer::builder().bind("0.0.0.0:3000").build().await?;
//! server.run().await
//! # }
//! ```

pub mod coordinator;
mod error;
mod handler;
mod server;

pub use error::NoughtsError;
pub use server::{
    DEFAULT_BIND, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_SEND_TIMEOUT, NoughtsServer, ServerBuilder,
};

/// Convenient re-exports for embedding the server.
pub mod prelude {
    pub use crate::coordinator::{Command, Coordinator};
    pub use crate::{NoughtsError, NoughtsServer, ServerBuilder};
    pub use noughts_protocol::{
        Board, ClientMessage, Codec, JsonCodec, Mark, PlayerInfo, RoomId, RoomInfo,
        RoomSummary, ServerMessage,
    };
    pub use noughts_room::{Room, RoomConfig, RoomError, RoomRegistry, RoomState};
    pub use noughts_transport::ConnectionId;
}
