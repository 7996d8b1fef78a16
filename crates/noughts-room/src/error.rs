//! Error types for the room layer.
//!
//! The `Display` text of each variant is what the requesting client sees
//! in its `error` reply.

use std::fmt;

use noughts_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("Room {0} not found")]
    NotFound(RoomId),

    /// Both seats are taken. Joining as a spectator still works.
    #[error("Room {0} is full. You can join as a spectator instead")]
    RoomFull(RoomId),

    /// The connection already participates in this room.
    #[error("Already in room {0}")]
    AlreadyInRoom(RoomId),

    /// Only the host may start the game.
    #[error("Only the host can start the game")]
    NotHost,

    /// A start was requested before both seats were filled.
    #[error("Need 2 players to start the game")]
    InsufficientPlayers,

    /// A start was requested while a game is running.
    #[error("Game already in progress")]
    GameInProgress,

    /// The move was refused; the board is unchanged.
    #[error("Invalid move: {0}")]
    IllegalMove(MoveRejection),

    /// Spectators and strangers cannot reset the board.
    #[error("Only players can reset the game")]
    NotAPlayer,

    /// The registry already holds a room with this id.
    #[error("Room {0} already exists")]
    DuplicateRoom(RoomId),
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// No game is running.
    GameNotActive,
    /// The requester does not hold a seat.
    NotAPlayer,
    /// It is the other symbol's turn.
    NotYourTurn,
    /// The index is not in `0..9`.
    OutOfRange,
    /// The cell already holds a mark.
    CellOccupied,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::GameNotActive => "game not started yet",
            Self::NotAPlayer => "you are not a player in this room",
            Self::NotYourTurn => "not your turn",
            Self::OutOfRange => "cell index must be 0-8",
            Self::CellOccupied => "cell is occupied",
        };
        f.write_str(text)
    }
}

impl From<MoveRejection> for RoomError {
    fn from(reason: MoveRejection) -> Self {
        Self::IllegalMove(reason)
    }
}
