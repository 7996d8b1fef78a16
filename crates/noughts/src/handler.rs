//! Per-connection handler: upgrade, decode inbound frames, write outbound ones.
//!
//! Each accepted socket gets its own Tokio task running this handler.
//! The flow is:
//!   1. Finish the WebSocket upgrade within the handshake deadline
//!   2. Register an outbox for the connection
//!   3. Loop: either decode a frame and forward it to the coordinator, or
//!      encode the next queued message and send it within the send deadline
//!   4. On exit the guard tells the coordinator the connection is gone

use std::time::Duration;

use noughts_protocol::{Codec, JsonCodec, ServerMessage};
use noughts_transport::{Connection, ConnectionId, Incoming, TransportError};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::NoughtsError;
use crate::coordinator::{Command, CommandSender};

/// Deadlines applied to every connection.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    pub(crate) handshake: Duration,
    pub(crate) send: Duration,
}

/// Drop guard that reports the connection closed when the handler exits.
///
/// Fires on every exit path, including errors and panics, so the
/// coordinator always gets a chance to clean up the rooms.
struct DisconnectGuard {
    conn: ConnectionId,
    commands: CommandSender,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Closed { conn: self.conn });
    }
}

/// Handles a single socket from accept to close.
pub(crate) async fn handle_connection<I>(
    incoming: I,
    commands: CommandSender,
    codec: JsonCodec,
    limits: Limits,
) -> Result<(), NoughtsError>
where
    I: Incoming<Error = TransportError>,
    I::Connection: Connection<Error = TransportError>,
{
    let addr = incoming.peer_addr();
    let conn = match timeout(limits.handshake, incoming.upgrade()).await {
        Ok(upgraded) => upgraded?,
        Err(_) => {
            tracing::debug!(%addr, "handshake timed out");
            return Err(NoughtsError::HandshakeTimeout);
        }
    };
    serve(conn, commands, codec, limits).await
}

/// Runs the message loop for an upgraded connection.
async fn serve<C>(
    conn: C,
    commands: CommandSender,
    codec: JsonCodec,
    limits: Limits,
) -> Result<(), NoughtsError>
where
    C: Connection<Error = TransportError>,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbox, mut outbound) = mpsc::unbounded_channel::<ServerMessage>();
    let _guard = DisconnectGuard {
        conn: conn_id,
        commands: commands.clone(),
    };

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };

                match codec.decode_client(&data) {
                    Ok(msg) => {
                        let command = Command::Inbound {
                            conn: conn_id,
                            outbox: outbox.clone(),
                            msg,
                        };
                        commands
                            .send(command)
                            .map_err(|_| NoughtsError::CoordinatorStopped)?;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "failed to decode frame");
                        // Queued behind anything already bound for this client.
                        let _ = outbox.send(ServerMessage::error(e.client_message()));
                    }
                }
            }
            Some(msg) = outbound.recv() => {
                let text = codec.encode_text(&msg)?;
                match timeout(limits.send, conn.send(&text)).await {
                    Ok(sent) => sent?,
                    Err(_) => {
                        tracing::info!(
                            %conn_id,
                            pending = outbound.len(),
                            "client stopped reading"
                        );
                        return Err(NoughtsError::SendTimeout);
                    }
                }
            }
        }
    }

    let _ = timeout(limits.send, conn.close()).await;
    // _guard drops here → coordinator removes the connection from its rooms.
    Ok(())
}
