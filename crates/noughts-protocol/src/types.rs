//! Core protocol types for the noughts wire format.
//!
//! Every type here travels "on the wire": clients send [`ClientMessage`]
//! records and the server answers with [`ServerMessage`] records, both as
//! JSON objects carrying a mandatory `type` discriminator.

use std::fmt;

use noughts_transport::ConnectionId;
use rand::Rng;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A short, human-typeable room code such as `"K3Q9ZD"`.
///
/// Codes coming from clients are trimmed and upper-cased on the way in
/// (`#[serde(from = "String")]`), so `" k3q9zd"` finds the same room.
/// Serialized as a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Number of characters in a generated room code.
    pub const LEN: usize = 6;

    /// Characters a generated room code is drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Builds a room id from arbitrary client input, normalising it.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    /// Draws a fresh random code. Uniqueness is the registry's job.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let code = (0..Self::LEN)
            .map(|_| {
                let idx = rng.random_range(0..Self::ALPHABET.len());
                char::from(Self::ALPHABET[idx])
            })
            .collect();
        Self(code)
    }

    /// Returns `true` if this is exactly six uppercase alphanumerics.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LEN
            && self.0.bytes().all(|b| Self::ALPHABET.contains(&b))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for RoomId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Marks and the board
// ---------------------------------------------------------------------------

/// The symbol a player places on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The symbol that moves after this one.
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::O => "O",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of cells on the 3x3 board.
pub const BOARD_CELLS: usize = 9;

/// The 3x3 board, stored row-major as cells `0..9`.
///
/// On the wire it is an array of nine strings: `""` for an empty cell,
/// `"X"` or `"O"` for a filled one. This matches what browser clients
/// render directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board([Option<Mark>; BOARD_CELLS]);

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from explicit cells. Mostly useful in tests.
    pub fn from_cells(cells: [Option<Mark>; BOARD_CELLS]) -> Self {
        Self(cells)
    }

    /// Returns the mark at `index`, or `None` if empty or out of range.
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.0.get(index).copied().flatten()
    }

    /// Returns `true` if `index` is on the board and empty.
    pub fn is_free(&self, index: usize) -> bool {
        index < BOARD_CELLS && self.0[index].is_none()
    }

    /// Writes `mark` into an empty cell.
    ///
    /// Returns `false` (and leaves the board untouched) if the cell is
    /// out of range or already taken.
    pub fn place(&mut self, index: usize, mark: Mark) -> bool {
        if !self.is_free(index) {
            return false;
        }
        self.0[index] = Some(mark);
        true
    }

    /// Returns `true` when no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.0 = [None; BOARD_CELLS];
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(BOARD_CELLS))?;
        for cell in &self.0 {
            seq.serialize_element(cell.map_or("", Mark::as_str))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BoardVisitor;

        impl<'de> Visitor<'de> for BoardVisitor {
            type Value = Board;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an array of {BOARD_CELLS} cells")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Board, A::Error> {
                let mut cells = [None; BOARD_CELLS];
                for (i, cell) in cells.iter_mut().enumerate() {
                    let raw: String = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                    *cell = match raw.as_str() {
                        "" => None,
                        "X" => Some(Mark::X),
                        "O" => Some(Mark::O),
                        other => {
                            return Err(de::Error::invalid_value(
                                de::Unexpected::Str(other),
                                &"\"\", \"X\" or \"O\"",
                            ));
                        }
                    };
                }
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(BOARD_CELLS + 1, &self));
                }
                Ok(Board(cells))
            }
        }

        deserializer.deserialize_seq(BoardVisitor)
    }
}

// ---------------------------------------------------------------------------
// Room views
// ---------------------------------------------------------------------------

/// Public view of a seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub symbol: Mark,
}

/// Public view of a spectator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectatorInfo {
    pub name: String,
}

/// Full snapshot of a room, embedded in join replies and membership updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub players: Vec<PlayerInfo>,
    pub spectators: Vec<SpectatorInfo>,
    pub game_active: bool,
    pub current_player: Mark,
    pub board: Board,
}

/// One row of a room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub player_count: usize,
    pub spectator_count: usize,
    pub game_active: bool,
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who in a room should receive a server message.
///
/// Room operations return a list of `(Recipient, ServerMessage)` pairs and
/// the room delivers them in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every current player and spectator.
    All,
    /// One specific participant.
    Connection(ConnectionId),
    /// Everyone except the given participant.
    AllExcept(ConnectionId),
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Requests a client can send.
///
/// `#[serde(tag = "type")]` gives the "internally tagged" shape
/// `{ "type": "makeMove", "roomId": "K3Q9ZD", "index": 4 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Open a new room and take the first seat.
    CreateRoom {
        #[serde(default)]
        player_name: String,
    },

    /// Join an existing room as a player or a spectator.
    JoinRoom {
        room_id: RoomId,
        #[serde(default)]
        player_name: String,
        #[serde(default)]
        as_spectator: bool,
    },

    /// Host asks to begin the match.
    StartGame { room_id: RoomId },

    /// Place the caller's mark. `index` is signed so that negative input
    /// is reported as an illegal move rather than a parse failure.
    MakeMove { room_id: RoomId, index: i64 },

    /// Clear the board and play again.
    ResetGame { room_id: RoomId },

    /// List every live room.
    GetRooms,
}

impl ClientMessage {
    /// Every `type` tag a client may send.
    pub const KINDS: [&'static str; 6] = [
        "createRoom",
        "joinRoom",
        "startGame",
        "makeMove",
        "resetGame",
        "getRooms",
    ];

    /// Returns the wire tag of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::StartGame { .. } => "startGame",
            Self::MakeMove { .. } => "makeMove",
            Self::ResetGame { .. } => "resetGame",
            Self::GetRooms => "getRooms",
        }
    }
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Events and replies the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Direct reply to `createRoom`.
    RoomCreated {
        room_id: RoomId,
        player: PlayerInfo,
        room_info: RoomInfo,
    },

    /// Direct reply to a successful player `joinRoom`.
    JoinedRoom {
        player: PlayerInfo,
        room_info: RoomInfo,
    },

    /// Direct reply to a spectator `joinRoom`, with a full game snapshot.
    JoinedAsSpectator {
        room_info: RoomInfo,
        board: Board,
        current_player: Mark,
        game_active: bool,
        game_started: bool,
    },

    /// Membership changed.
    PlayerJoined {
        players: Vec<PlayerInfo>,
        player_count: usize,
        room_info: RoomInfo,
    },

    /// Both seats are filled; the host may start.
    ReadyToStart {
        message: String,
        players: Vec<PlayerInfo>,
    },

    /// A seat is free again.
    WaitingForPlayers {
        message: String,
        players: Vec<PlayerInfo>,
        player_count: usize,
    },

    /// The match began.
    GameStart {
        players: Vec<PlayerInfo>,
        current_player: Mark,
        message: String,
    },

    /// A move was accepted and the turn passed.
    Move {
        board: Board,
        current_player: Mark,
        move_by: String,
    },

    /// The match ended in a win or a draw.
    GameEnd {
        board: Board,
        winner: Option<Mark>,
        is_draw: bool,
        winner_name: Option<String>,
    },

    /// The board was cleared.
    GameReset {
        board: Board,
        current_player: Mark,
    },

    /// A player left mid-game.
    PlayerDisconnected {
        message: String,
        disconnected_player: String,
        remaining_players: Vec<PlayerInfo>,
    },

    /// Reply to `getRooms`.
    RoomsList { rooms: Vec<RoomSummary> },

    /// Something about the request was rejected.
    Error { message: String },
}

impl ServerMessage {
    /// Shorthand for an `error` reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns the wire tag of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "roomCreated",
            Self::JoinedRoom { .. } => "joinedRoom",
            Self::JoinedAsSpectator { .. } => "joinedAsSpectator",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::ReadyToStart { .. } => "readyToStart",
            Self::WaitingForPlayers { .. } => "waitingForPlayers",
            Self::GameStart { .. } => "gameStart",
            Self::Move { .. } => "move",
            Self::GameEnd { .. } => "gameEnd",
            Self::GameReset { .. } => "gameReset",
            Self::PlayerDisconnected { .. } => "playerDisconnected",
            Self::RoomsList { .. } => "roomsList",
            Self::Error { .. } => "error",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
