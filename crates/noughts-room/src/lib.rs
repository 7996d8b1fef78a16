//! Room state for noughts.
//!
//! A [`Room`] is one tic-tac-toe match: two seats, any number of
//! spectators, a board and a turn. The [`RoomRegistry`] owns every room
//! and cleans up after disconnects. Both are synchronous; the server
//! drives them from a single task so no locking is needed.
//!
//! # Key types
//!
//! - [`Room`]: per-match state machine, returns events to deliver
//! - [`RoomRegistry`]: creates, finds and destroys rooms
//! - [`RoomState`]: lifecycle derived from the room's flags
//! - [`RoomConfig`]: start policy shared by all rooms
//! - [`RoomError`]: every refusal a client can receive

mod config;
mod error;
pub mod logic;
mod registry;
mod room;

pub use config::{DEFAULT_NAME, MAX_NAME_LEN, MAX_PLAYERS, RoomConfig, RoomState};
pub use error::{MoveRejection, RoomError};
pub use logic::Outcome;
pub use registry::RoomRegistry;
pub use room::{Outbound, Outbox, Room, display_name};
