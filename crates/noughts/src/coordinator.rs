//! The coordinator: one task that owns every room.
//!
//! Connection handlers never touch room state. They decode frames and
//! forward them as [`Command`]s over a channel; the coordinator applies
//! them one at a time, in arrival order, so no two operations ever
//! interleave and no locks are needed. Replies and broadcasts go back out
//! through each connection's [`Outbox`].

use noughts_protocol::{ClientMessage, RoomId, ServerMessage};
use noughts_room::{Outbox, RoomConfig, RoomError, RoomRegistry};
use noughts_transport::ConnectionId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Work items sent from connection handlers to the coordinator.
#[derive(Debug)]
pub enum Command {
    /// A decoded client request. `outbox` reaches the sender.
    Inbound {
        conn: ConnectionId,
        outbox: Outbox,
        msg: ClientMessage,
    },
    /// The connection is gone.
    Closed { conn: ConnectionId },
}

/// Sending half of the coordinator's command channel.
pub type CommandSender = mpsc::UnboundedSender<Command>;

/// Routes client requests to rooms and cleans up after disconnects.
#[derive(Debug, Default)]
pub struct Coordinator {
    registry: RoomRegistry,
}

impl Coordinator {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            registry: RoomRegistry::new(config),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Applies one command.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Inbound { conn, outbox, msg } => self.handle_message(conn, &outbox, msg),
            Command::Closed { conn } => self.disconnect(conn),
        }
    }

    /// Handles one client request.
    ///
    /// Rejections go back to the requester as an `error` reply and leave
    /// every room untouched.
    pub fn handle_message(&mut self, conn: ConnectionId, outbox: &Outbox, msg: ClientMessage) {
        let kind = msg.kind();
        tracing::debug!(%conn, kind, "handling request");

        if let Err(e) = self.route(conn, outbox, msg) {
            tracing::debug!(%conn, kind, error = %e, "request rejected");
            reply(outbox, ServerMessage::error(e.to_string()));
        }
    }

    /// Removes `conn` from every room and destroys rooms left empty.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        let rooms = self.registry.disconnect(conn);
        tracing::info!(%conn, rooms = rooms.len(), "connection closed");
    }

    fn route(
        &mut self,
        conn: ConnectionId,
        outbox: &Outbox,
        msg: ClientMessage,
    ) -> Result<(), RoomError> {
        match msg {
            ClientMessage::CreateRoom { player_name } => {
                self.create_room(conn, outbox, &player_name)
            }
            ClientMessage::JoinRoom {
                room_id,
                player_name,
                as_spectator,
            } => {
                let room = self.registry.get_mut(&room_id)?;
                if as_spectator {
                    let events = room.add_spectator(conn, outbox.clone(), &player_name)?;
                    reply(outbox, room.spectator_snapshot());
                    room.dispatch(events);
                } else {
                    let (player, events) = room.add_player(conn, outbox.clone(), &player_name)?;
                    reply(
                        outbox,
                        ServerMessage::JoinedRoom {
                            player,
                            room_info: room.info(),
                        },
                    );
                    room.dispatch(events);
                }
                Ok(())
            }
            ClientMessage::StartGame { room_id } => {
                let room = self.registry.get_mut(&room_id)?;
                let events = room.start_game(conn)?;
                room.dispatch(events);
                Ok(())
            }
            ClientMessage::MakeMove { room_id, index } => {
                let room = self.registry.get_mut(&room_id)?;
                let events = room.make_move(conn, index)?;
                room.dispatch(events);
                Ok(())
            }
            ClientMessage::ResetGame { room_id } => {
                let room = self.registry.get_mut(&room_id)?;
                let events = room.reset_game(conn)?;
                room.dispatch(events);
                Ok(())
            }
            ClientMessage::GetRooms => {
                reply(
                    outbox,
                    ServerMessage::RoomsList {
                        rooms: self.registry.summaries(),
                    },
                );
                Ok(())
            }
        }
    }

    fn create_room(
        &mut self,
        conn: ConnectionId,
        outbox: &Outbox,
        player_name: &str,
    ) -> Result<(), RoomError> {
        let room_id: RoomId = self.registry.create_room();
        let room = self.registry.get_mut(&room_id)?;
        let (player, events) = match room.add_player(conn, outbox.clone(), player_name) {
            Ok(joined) => joined,
            Err(e) => {
                self.registry.remove(&room_id);
                return Err(e);
            }
        };
        reply(
            outbox,
            ServerMessage::RoomCreated {
                room_id,
                player,
                room_info: room.info(),
            },
        );
        room.dispatch(events);
        Ok(())
    }
}

/// Spawns the coordinator task.
///
/// The task runs until every [`CommandSender`] is dropped and then hands
/// the coordinator back through the join handle.
pub fn spawn(mut coordinator: Coordinator) -> (CommandSender, JoinHandle<Coordinator>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        tracing::debug!("coordinator started");
        while let Some(command) = rx.recv().await {
            coordinator.apply(command);
        }
        tracing::debug!(rooms = coordinator.registry.len(), "coordinator stopped");
        coordinator
    });
    (tx, task)
}

fn reply(outbox: &Outbox, msg: ServerMessage) {
    let _ = outbox.send(msg);
}
