//! Room configuration and lifecycle states.

/// Seats in a room. Tic-tac-toe is strictly two-player.
pub const MAX_PLAYERS: usize = 2;

/// Longest display name kept, in characters.
pub const MAX_NAME_LEN: usize = 20;

/// Name used when a client sends an empty or missing display name.
pub const DEFAULT_NAME: &str = "Anonymous";

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration applied to every room the registry creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// When `true`, a full room waits in `ReadyToStart` until the host
    /// sends `startGame`. When `false`, the second join starts the game.
    pub require_explicit_start: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            require_explicit_start: true,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room, derived from its seats and flags.
///
/// ```text
/// WaitingForPlayers -> ReadyToStart -> InProgress -> Ended
///        ^                  ^              |           |
///        +--(departure)-----+---(reset)----+-----------+
/// ```
///
/// - **WaitingForPlayers**: zero or one seated player.
/// - **ReadyToStart**: both seats filled, no game running yet.
/// - **InProgress**: moves are being accepted.
/// - **Ended**: the last game finished with a win or a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    WaitingForPlayers,
    ReadyToStart,
    InProgress,
    Ended,
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::ReadyToStart => write!(f, "ReadyToStart"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_display() {
        assert_eq!(RoomState::ReadyToStart.to_string(), "ReadyToStart");
        assert_eq!(RoomState::Ended.to_string(), "Ended");
    }

    #[test]
    fn test_room_config_default_requires_host_start() {
        assert!(RoomConfig::default().require_explicit_start);
    }
}
