//! One match: seats, spectators, board and turn.
//!
//! A `Room` is plain synchronous state. Every operation validates, mutates
//! and returns the events it produced as `(Recipient, ServerMessage)`
//! pairs; [`Room::dispatch`] then pushes them into the participants'
//! outboxes in order. Callers must serialize access to a room (the
//! coordinator does this by owning every room on a single task).

use noughts_protocol::{
    BOARD_CELLS, Board, Mark, PlayerInfo, Recipient, RoomId, RoomInfo, RoomSummary,
    ServerMessage, SpectatorInfo,
};
use noughts_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::logic::{self, Outcome};
use crate::{
    DEFAULT_NAME, MAX_NAME_LEN, MAX_PLAYERS, MoveRejection, RoomConfig, RoomError, RoomState,
};

/// Delivery handle for one connection's outbound messages.
///
/// The room keeps a clone of it next to the `ConnectionId`; it never
/// owns or closes the connection itself.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Events produced by a room operation, in delivery order.
pub type Outbound = Vec<(Recipient, ServerMessage)>;

/// Trims a client-supplied display name and caps its length.
pub fn display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_NAME.to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

#[derive(Debug)]
struct Seat {
    conn: ConnectionId,
    name: String,
    symbol: Mark,
    outbox: Outbox,
}

impl Seat {
    fn info(&self) -> PlayerInfo {
        PlayerInfo {
            name: self.name.clone(),
            symbol: self.symbol,
        }
    }
}

#[derive(Debug)]
struct Watcher {
    conn: ConnectionId,
    name: String,
    outbox: Outbox,
}

/// A single tic-tac-toe match and its audience.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    board: Board,
    /// Seated players in join order. `players[0]` is the host.
    players: Vec<Seat>,
    spectators: Vec<Watcher>,
    current_player: Mark,
    game_active: bool,
    game_started: bool,
}

impl Room {
    /// Creates an empty room waiting for players.
    pub fn new(id: RoomId, config: RoomConfig) -> Self {
        Self {
            id,
            config,
            board: Board::new(),
            players: Vec::with_capacity(MAX_PLAYERS),
            spectators: Vec::new(),
            current_player: Mark::X,
            game_active: false,
            game_started: false,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Mark {
        self.current_player
    }

    pub fn is_active(&self) -> bool {
        self.game_active
    }

    pub fn is_started(&self) -> bool {
        self.game_started
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    /// Returns `true` once the last player and spectator have gone.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.spectators.is_empty()
    }

    /// Returns `true` if `conn` holds a seat or watches this room.
    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.players.iter().any(|p| p.conn == conn)
            || self.spectators.iter().any(|s| s.conn == conn)
    }

    /// The connection allowed to start the game.
    pub fn host(&self) -> Option<ConnectionId> {
        self.players.first().map(|p| p.conn)
    }

    /// Seated players in join order.
    pub fn players(&self) -> Vec<PlayerInfo> {
        self.players.iter().map(Seat::info).collect()
    }

    pub fn state(&self) -> RoomState {
        if self.game_active {
            RoomState::InProgress
        } else if self.players.len() < MAX_PLAYERS {
            RoomState::WaitingForPlayers
        } else if self.game_started {
            RoomState::Ended
        } else {
            RoomState::ReadyToStart
        }
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.id.clone(),
            players: self.players(),
            spectators: self
                .spectators
                .iter()
                .map(|s| SpectatorInfo {
                    name: s.name.clone(),
                })
                .collect(),
            game_active: self.game_active,
            current_player: self.current_player,
            board: self.board,
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            player_count: self.players.len(),
            spectator_count: self.spectators.len(),
            game_active: self.game_active,
        }
    }

    /// The catch-up message a new spectator receives.
    pub fn spectator_snapshot(&self) -> ServerMessage {
        ServerMessage::JoinedAsSpectator {
            room_info: self.info(),
            board: self.board,
            current_player: self.current_player,
            game_active: self.game_active,
            game_started: self.game_started,
        }
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Seats a new player.
    ///
    /// The first seat taken gets `X`, the other `O`; after a departure the
    /// newcomer takes whichever symbol is vacant. Filling the second seat
    /// either announces `readyToStart` or, with explicit start disabled,
    /// starts the game.
    pub fn add_player(
        &mut self,
        conn: ConnectionId,
        outbox: Outbox,
        name: &str,
    ) -> Result<(PlayerInfo, Outbound), RoomError> {
        if self.contains(conn) {
            return Err(RoomError::AlreadyInRoom(self.id.clone()));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull(self.id.clone()));
        }

        let seat = Seat {
            conn,
            name: display_name(name),
            symbol: self.vacant_symbol(),
            outbox,
        };
        let info = seat.info();
        self.players.push(seat);

        tracing::info!(
            room_id = %self.id,
            %conn,
            symbol = %info.symbol,
            players = self.players.len(),
            state = %self.state(),
            "player joined"
        );

        let mut out = vec![(Recipient::All, self.membership_update())];
        if self.players.len() == MAX_PLAYERS {
            if self.config.require_explicit_start {
                out.push((
                    Recipient::All,
                    ServerMessage::ReadyToStart {
                        message: "Both players joined! Host can start the game.".into(),
                        players: self.players(),
                    },
                ));
            } else {
                out.push((Recipient::All, self.begin()));
            }
        }

        Ok((info, out))
    }

    /// Admits a read-only spectator. Never refused for capacity.
    ///
    /// The returned events notify everyone else; the spectator's own
    /// catch-up comes from [`Room::spectator_snapshot`].
    pub fn add_spectator(
        &mut self,
        conn: ConnectionId,
        outbox: Outbox,
        name: &str,
    ) -> Result<Outbound, RoomError> {
        if self.contains(conn) {
            return Err(RoomError::AlreadyInRoom(self.id.clone()));
        }
        self.spectators.push(Watcher {
            conn,
            name: display_name(name),
            outbox,
        });
        tracing::info!(
            room_id = %self.id,
            %conn,
            spectators = self.spectators.len(),
            "spectator joined"
        );
        Ok(vec![(Recipient::AllExcept(conn), self.membership_update())])
    }

    /// Removes `conn` from the room, whatever its role.
    ///
    /// Returns `None` if `conn` was not here. A player leaving mid-game
    /// aborts the match (`playerDisconnected` plus a board reset); any
    /// player departure then announces `waitingForPlayers`.
    pub fn remove_participant(&mut self, conn: ConnectionId) -> Option<Outbound> {
        if let Some(pos) = self.players.iter().position(|p| p.conn == conn) {
            let departed = self.players.remove(pos);
            tracing::info!(
                room_id = %self.id,
                %conn,
                symbol = %departed.symbol,
                players = self.players.len(),
                "player left"
            );

            let mut out = Vec::new();
            if self.game_active {
                out.push((
                    Recipient::All,
                    ServerMessage::PlayerDisconnected {
                        message: format!("{} left the game.", departed.name),
                        disconnected_player: departed.name.clone(),
                        remaining_players: self.players(),
                    },
                ));
                self.board.clear();
                self.current_player = Mark::X;
                self.game_active = false;
            }

            self.game_started = false;
            out.push((
                Recipient::All,
                ServerMessage::WaitingForPlayers {
                    message: format!("{} left. Waiting for another player...", departed.name),
                    players: self.players(),
                    player_count: self.players.len(),
                },
            ));
            return Some(out);
        }

        let pos = self.spectators.iter().position(|s| s.conn == conn)?;
        self.spectators.remove(pos);
        tracing::info!(room_id = %self.id, %conn, "spectator left");
        Some(Vec::new())
    }

    // -----------------------------------------------------------------
    // Game flow
    // -----------------------------------------------------------------

    /// Starts the match on behalf of the host.
    pub fn start_game(&mut self, conn: ConnectionId) -> Result<Outbound, RoomError> {
        if self.host() != Some(conn) {
            return Err(RoomError::NotHost);
        }
        if self.players.len() != MAX_PLAYERS {
            return Err(RoomError::InsufficientPlayers);
        }
        if self.game_active {
            return Err(RoomError::GameInProgress);
        }
        Ok(vec![(Recipient::All, self.begin())])
    }

    /// Places the requester's mark at `index`.
    ///
    /// On any rejection the board, turn and flags are untouched and nothing
    /// is broadcast.
    pub fn make_move(&mut self, conn: ConnectionId, index: i64) -> Result<Outbound, RoomError> {
        if !self.game_active {
            return Err(MoveRejection::GameNotActive.into());
        }
        let (symbol, mover) = self
            .players
            .iter()
            .find(|p| p.conn == conn)
            .map(|p| (p.symbol, p.name.clone()))
            .ok_or(MoveRejection::NotAPlayer)?;
        if symbol != self.current_player {
            return Err(MoveRejection::NotYourTurn.into());
        }
        let cell = usize::try_from(index)
            .ok()
            .filter(|i| *i < BOARD_CELLS)
            .ok_or(MoveRejection::OutOfRange)?;
        if !self.board.place(cell, symbol) {
            return Err(MoveRejection::CellOccupied.into());
        }

        tracing::debug!(room_id = %self.id, %symbol, cell, "move accepted");

        let event = match logic::evaluate(&self.board) {
            Some(outcome) => {
                self.game_active = false;
                let winner = outcome.winner();
                let winner_name = winner.and_then(|mark| {
                    self.players
                        .iter()
                        .find(|p| p.symbol == mark)
                        .map(|p| p.name.clone())
                });
                tracing::info!(
                    room_id = %self.id,
                    winner = ?winner,
                    draw = outcome == Outcome::Draw,
                    "game ended"
                );
                ServerMessage::GameEnd {
                    board: self.board,
                    winner,
                    is_draw: outcome == Outcome::Draw,
                    winner_name,
                }
            }
            None => {
                self.current_player = self.current_player.opponent();
                ServerMessage::Move {
                    board: self.board,
                    current_player: self.current_player,
                    move_by: mover,
                }
            }
        };
        Ok(vec![(Recipient::All, event)])
    }

    /// Clears the board for another round. Players only.
    ///
    /// The game becomes active again immediately if both seats are filled.
    pub fn reset_game(&mut self, conn: ConnectionId) -> Result<Outbound, RoomError> {
        if !self.players.iter().any(|p| p.conn == conn) {
            return Err(RoomError::NotAPlayer);
        }
        self.board.clear();
        self.current_player = Mark::X;
        self.game_active = self.players.len() == MAX_PLAYERS;
        if self.game_active {
            self.game_started = true;
        }
        tracing::info!(room_id = %self.id, state = %self.state(), "game reset");
        Ok(vec![(
            Recipient::All,
            ServerMessage::GameReset {
                board: self.board,
                current_player: self.current_player,
            },
        )])
    }

    // -----------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------

    /// Delivers events to the current participants.
    ///
    /// Sends to a closed outbox are dropped silently; that connection's
    /// close is already on its way to the coordinator.
    pub fn dispatch(&self, events: Outbound) {
        for (recipient, msg) in events {
            for outbox in self.outboxes(recipient) {
                let _ = outbox.send(msg.clone());
            }
        }
    }

    fn outboxes(&self, recipient: Recipient) -> impl Iterator<Item = &Outbox> {
        let players = self.players.iter().map(|p| (p.conn, &p.outbox));
        let spectators = self.spectators.iter().map(|s| (s.conn, &s.outbox));
        players
            .chain(spectators)
            .filter(move |(conn, _)| match recipient {
                Recipient::All => true,
                Recipient::Connection(target) => *conn == target,
                Recipient::AllExcept(excluded) => *conn != excluded,
            })
            .map(|(_, outbox)| outbox)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn vacant_symbol(&self) -> Mark {
        if self.players.iter().any(|p| p.symbol == Mark::X) {
            Mark::O
        } else {
            Mark::X
        }
    }

    fn membership_update(&self) -> ServerMessage {
        ServerMessage::PlayerJoined {
            players: self.players(),
            player_count: self.players.len(),
            room_info: self.info(),
        }
    }

    /// Puts the room into play on a fresh board with `X` to move.
    fn begin(&mut self) -> ServerMessage {
        self.board.clear();
        self.current_player = Mark::X;
        self.game_active = true;
        self.game_started = true;
        tracing::info!(room_id = %self.id, "game started");
        ServerMessage::GameStart {
            players: self.players(),
            current_player: self.current_player,
            message: "Game started!".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn outbox() -> (Outbox, UnboundedReceiver<ServerMessage>) {
        mpsc::unbounded_channel()
    }

    fn room() -> Room {
        Room::new(RoomId::new("ROOM01"), RoomConfig::default())
    }

    /// Two players seated and the game started by the host.
    fn started_room() -> Room {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        room.add_player(conn(2), outbox().0, "bob").unwrap();
        room.start_game(conn(1)).unwrap();
        room
    }

    fn kinds(out: &Outbound) -> Vec<&'static str> {
        out.iter().map(|(_, m)| m.kind()).collect()
    }

    // =====================================================================
    // Membership
    // =====================================================================

    #[test]
    fn test_symbols_follow_join_order() {
        let mut room = room();
        let (p1, _) = room.add_player(conn(1), outbox().0, "alice").unwrap();
        let (p2, _) = room.add_player(conn(2), outbox().0, "bob").unwrap();
        assert_eq!(p1.symbol, Mark::X);
        assert_eq!(p2.symbol, Mark::O);
        assert_eq!(room.host(), Some(conn(1)));
    }

    #[test]
    fn test_second_join_announces_ready_without_starting() {
        let mut room = room();
        let (_, out) = room.add_player(conn(1), outbox().0, "alice").unwrap();
        assert_eq!(kinds(&out), ["playerJoined"]);
        assert_eq!(room.state(), RoomState::WaitingForPlayers);

        let (_, out) = room.add_player(conn(2), outbox().0, "bob").unwrap();
        assert_eq!(kinds(&out), ["playerJoined", "readyToStart"]);
        assert_eq!(room.state(), RoomState::ReadyToStart);
        assert!(!room.is_active());
    }

    #[test]
    fn test_auto_start_policy_starts_on_second_join() {
        let mut room = Room::new(
            RoomId::new("ROOM02"),
            RoomConfig {
                require_explicit_start: false,
            },
        );
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        let (_, out) = room.add_player(conn(2), outbox().0, "bob").unwrap();
        assert_eq!(kinds(&out), ["playerJoined", "gameStart"]);
        assert!(room.is_active());
        assert_eq!(room.current_player(), Mark::X);
    }

    #[test]
    fn test_third_player_is_refused() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        room.add_player(conn(2), outbox().0, "bob").unwrap();
        let err = room.add_player(conn(3), outbox().0, "carol").unwrap_err();
        assert_eq!(err, RoomError::RoomFull(RoomId::new("ROOM01")));
        assert_eq!(room.player_count(), 2);

        // Spectating is always possible.
        room.add_spectator(conn(3), outbox().0, "carol").unwrap();
        assert_eq!(room.spectator_count(), 1);
    }

    #[test]
    fn test_same_connection_cannot_join_twice() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        assert!(matches!(
            room.add_player(conn(1), outbox().0, "alice"),
            Err(RoomError::AlreadyInRoom(_))
        ));
        assert!(matches!(
            room.add_spectator(conn(1), outbox().0, "alice"),
            Err(RoomError::AlreadyInRoom(_))
        ));
    }

    #[test]
    fn test_spectator_update_excludes_the_spectator() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        let out = room.add_spectator(conn(9), outbox().0, "sam").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, Recipient::AllExcept(conn(9)));

        match room.spectator_snapshot() {
            ServerMessage::JoinedAsSpectator {
                room_info,
                game_active,
                game_started,
                ..
            } => {
                assert_eq!(room_info.spectators.len(), 1);
                assert!(!game_active);
                assert!(!game_started);
            }
            other => panic!("expected JoinedAsSpectator, got {other:?}"),
        }
    }

    #[test]
    fn test_display_name_is_trimmed_and_capped() {
        assert_eq!(display_name("  alice  "), "alice");
        assert_eq!(display_name("   "), DEFAULT_NAME);
        assert_eq!(display_name(&"z".repeat(50)).chars().count(), MAX_NAME_LEN);
    }

    // =====================================================================
    // Start
    // =====================================================================

    #[test]
    fn test_start_by_second_player_is_not_host() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        room.add_player(conn(2), outbox().0, "bob").unwrap();
        assert_eq!(room.start_game(conn(2)), Err(RoomError::NotHost));
        assert!(!room.is_active());
    }

    #[test]
    fn test_start_by_spectator_is_not_host() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        room.add_player(conn(2), outbox().0, "bob").unwrap();
        room.add_spectator(conn(3), outbox().0, "sam").unwrap();
        assert_eq!(room.start_game(conn(3)), Err(RoomError::NotHost));
    }

    #[test]
    fn test_start_alone_is_insufficient() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        assert_eq!(
            room.start_game(conn(1)),
            Err(RoomError::InsufficientPlayers)
        );
    }

    #[test]
    fn test_host_start_activates_with_x() {
        let room = started_room();
        assert!(room.is_active());
        assert!(room.is_started());
        assert_eq!(room.current_player(), Mark::X);
        assert_eq!(room.state(), RoomState::InProgress);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut room = started_room();
        assert_eq!(room.start_game(conn(1)), Err(RoomError::GameInProgress));
    }

    // =====================================================================
    // Moves
    // =====================================================================

    #[test]
    fn test_turns_alternate_and_cells_stick() {
        let mut room = started_room();
        let order = [(1, 0), (2, 4), (1, 8), (2, 2), (1, 6)];
        let mut expected = Mark::X;
        for (who, cell) in order {
            assert_eq!(room.current_player(), expected);
            let out = room.make_move(conn(who), cell).unwrap();
            assert_eq!(kinds(&out), ["move"]);
            assert_eq!(room.board().get(cell as usize), Some(expected));
            expected = expected.opponent();
        }
        // Earlier marks are never overwritten.
        assert_eq!(room.board().get(0), Some(Mark::X));
        assert_eq!(room.board().get(4), Some(Mark::O));
    }

    #[test]
    fn test_top_row_win() {
        let mut room = started_room();
        room.make_move(conn(1), 0).unwrap(); // X
        room.make_move(conn(2), 4).unwrap(); // O
        room.make_move(conn(1), 1).unwrap(); // X
        room.make_move(conn(2), 8).unwrap(); // O
        assert_eq!(*room.board(), Board::from_cells([X, X, E, E, O, E, E, E, O]));

        let out = room.make_move(conn(1), 2).unwrap();
        match &out[0].1 {
            ServerMessage::GameEnd {
                winner,
                is_draw,
                winner_name,
                ..
            } => {
                assert_eq!(*winner, Some(Mark::X));
                assert!(!is_draw);
                assert_eq!(winner_name.as_deref(), Some("alice"));
            }
            other => panic!("expected GameEnd, got {other:?}"),
        }
        assert!(!room.is_active());
        assert_eq!(room.state(), RoomState::Ended);
    }

    #[test]
    fn test_full_board_is_draw() {
        let mut room = started_room();
        // X O X
        // X O O
        // O X X
        for (who, cell) in [(1, 0), (2, 1), (1, 2), (2, 4), (1, 3), (2, 5), (1, 7), (2, 6)] {
            room.make_move(conn(who), cell).unwrap();
        }
        let out = room.make_move(conn(1), 8).unwrap();
        assert_eq!(
            out[0].1,
            ServerMessage::GameEnd {
                board: Board::from_cells([X, O, X, X, O, O, O, X, X]),
                winner: None,
                is_draw: true,
                winner_name: None,
            }
        );
    }

    #[test]
    fn test_wrong_turn_leaves_board_unchanged() {
        let mut room = started_room();
        let before = *room.board();
        assert_eq!(
            room.make_move(conn(2), 0),
            Err(RoomError::IllegalMove(MoveRejection::NotYourTurn))
        );
        assert_eq!(*room.board(), before);
        assert_eq!(room.current_player(), Mark::X);
    }

    #[test]
    fn test_move_rejections() {
        let mut room = started_room();
        assert_eq!(
            room.make_move(conn(1), 9),
            Err(RoomError::IllegalMove(MoveRejection::OutOfRange))
        );
        assert_eq!(
            room.make_move(conn(1), -1),
            Err(RoomError::IllegalMove(MoveRejection::OutOfRange))
        );
        assert_eq!(
            room.make_move(conn(7), 0),
            Err(RoomError::IllegalMove(MoveRejection::NotAPlayer))
        );
        room.make_move(conn(1), 0).unwrap();
        assert_eq!(
            room.make_move(conn(2), 0),
            Err(RoomError::IllegalMove(MoveRejection::CellOccupied))
        );
        assert_eq!(room.current_player(), Mark::O);
    }

    #[test]
    fn test_move_before_start_is_rejected() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        room.add_player(conn(2), outbox().0, "bob").unwrap();
        assert_eq!(
            room.make_move(conn(1), 0),
            Err(RoomError::IllegalMove(MoveRejection::GameNotActive))
        );
    }

    // =====================================================================
    // Reset
    // =====================================================================

    #[test]
    fn test_reset_by_player_reactivates() {
        let mut room = started_room();
        room.make_move(conn(1), 0).unwrap();
        let out = room.reset_game(conn(2)).unwrap();
        assert_eq!(kinds(&out), ["gameReset"]);
        assert_eq!(*room.board(), Board::new());
        assert_eq!(room.current_player(), Mark::X);
        assert!(room.is_active());
    }

    #[test]
    fn test_reset_by_spectator_is_rejected() {
        let mut room = started_room();
        room.add_spectator(conn(3), outbox().0, "sam").unwrap();
        room.make_move(conn(1), 4).unwrap();
        assert_eq!(room.reset_game(conn(3)), Err(RoomError::NotAPlayer));
        assert_eq!(room.board().get(4), Some(Mark::X));
    }

    #[test]
    fn test_reset_with_one_player_stays_inactive() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        room.reset_game(conn(1)).unwrap();
        assert!(!room.is_active());
    }

    // =====================================================================
    // Departures
    // =====================================================================

    #[test]
    fn test_host_leaving_mid_game_aborts_and_waits() {
        let mut room = started_room();
        room.make_move(conn(1), 0).unwrap();

        let out = room.remove_participant(conn(1)).unwrap();
        assert_eq!(kinds(&out), ["playerDisconnected", "waitingForPlayers"]);
        match &out[0].1 {
            ServerMessage::PlayerDisconnected {
                disconnected_player,
                remaining_players,
                ..
            } => {
                assert_eq!(disconnected_player, "alice");
                assert_eq!(remaining_players.len(), 1);
                assert_eq!(remaining_players[0].symbol, Mark::O);
            }
            other => panic!("expected PlayerDisconnected, got {other:?}"),
        }
        assert_eq!(*room.board(), Board::new());
        assert!(!room.is_active());
        assert_eq!(room.state(), RoomState::WaitingForPlayers);
        assert_eq!(room.host(), Some(conn(2)));
    }

    #[test]
    fn test_newcomer_takes_vacant_symbol() {
        let mut room = started_room();
        room.remove_participant(conn(1));
        let (info, _) = room.add_player(conn(3), outbox().0, "carol").unwrap();
        assert_eq!(info.symbol, Mark::X);
        assert_eq!(
            room.players(),
            [
                PlayerInfo {
                    name: "bob".into(),
                    symbol: Mark::O,
                },
                info,
            ]
        );
    }

    #[test]
    fn test_leaving_before_start_only_waits() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        room.add_player(conn(2), outbox().0, "bob").unwrap();
        let out = room.remove_participant(conn(2)).unwrap();
        assert_eq!(kinds(&out), ["waitingForPlayers"]);
    }

    #[test]
    fn test_spectator_leaving_is_silent() {
        let mut room = started_room();
        room.add_spectator(conn(5), outbox().0, "sam").unwrap();
        let out = room.remove_participant(conn(5)).unwrap();
        assert!(out.is_empty());
        assert!(room.is_active());
    }

    #[test]
    fn test_removing_stranger_is_none() {
        let mut room = started_room();
        assert!(room.remove_participant(conn(42)).is_none());
    }

    #[test]
    fn test_room_empties() {
        let mut room = room();
        room.add_player(conn(1), outbox().0, "alice").unwrap();
        room.add_spectator(conn(2), outbox().0, "sam").unwrap();
        room.remove_participant(conn(1));
        assert!(!room.is_empty());
        room.remove_participant(conn(2));
        assert!(room.is_empty());
    }

    // =====================================================================
    // Delivery
    // =====================================================================

    #[test]
    fn test_dispatch_routes_by_recipient() {
        let mut room = room();
        let (tx1, mut rx1) = outbox();
        let (tx2, mut rx2) = outbox();
        room.add_player(conn(1), tx1, "alice").unwrap();
        room.add_spectator(conn(2), tx2, "sam").unwrap();

        room.dispatch(vec![
            (Recipient::All, ServerMessage::error("all")),
            (Recipient::Connection(conn(2)), ServerMessage::error("only sam")),
            (Recipient::AllExcept(conn(2)), ServerMessage::error("not sam")),
        ]);

        assert_eq!(rx1.try_recv().unwrap(), ServerMessage::error("all"));
        assert_eq!(rx1.try_recv().unwrap(), ServerMessage::error("not sam"));
        assert!(rx1.try_recv().is_err());

        assert_eq!(rx2.try_recv().unwrap(), ServerMessage::error("all"));
        assert_eq!(rx2.try_recv().unwrap(), ServerMessage::error("only sam"));
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_ignores_closed_outboxes() {
        let mut room = room();
        let (tx, rx) = outbox();
        room.add_player(conn(1), tx, "alice").unwrap();
        drop(rx);
        room.dispatch(vec![(Recipient::All, ServerMessage::error("gone"))]);
    }
}
