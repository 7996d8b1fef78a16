//! `NoughtsServer` builder and accept loop.
//!
//! This is the entry point for running the coordinator. It ties together
//! the layers: transport → handler → coordinator → rooms.

use std::future::Future;
use std::time::Duration;

use noughts_protocol::JsonCodec;
use noughts_room::RoomConfig;
use noughts_transport::{Transport, WebSocketTransport};

use crate::NoughtsError;
use crate::coordinator::{self, CommandSender, Coordinator};
use crate::handler::{Limits, handle_connection};

/// Address used when none is configured.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// How long a new socket may take to finish the WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long one outbound frame may take to reach the socket.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for configuring and starting a noughts server.
///
/// # Example
///
/// ```rust,no_run
/// use noughts::prelude::*;
///
/// # async fn start() -> Result<(), NoughtsError> {
/// let server = ServerBuilder::new()
///     .bind("127.0.0.1:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    limits: Limits,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            room_config: RoomConfig::default(),
            limits: Limits {
                handshake: DEFAULT_HANDSHAKE_TIMEOUT,
                send: DEFAULT_SEND_TIMEOUT,
            },
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the deadline for the WebSocket upgrade of a new socket.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.limits.handshake = timeout;
        self
    }

    /// Sets the deadline for writing one frame to a client.
    ///
    /// A client that stops reading is disconnected once a send exceeds it.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.limits.send = timeout;
        self
    }

    /// Binds the listener and starts the coordinator task.
    pub async fn build(self) -> Result<NoughtsServer, NoughtsError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let (commands, _) = coordinator::spawn(Coordinator::new(self.room_config));
        Ok(NoughtsServer {
            transport,
            commands,
            limits: self.limits,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound noughts server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct NoughtsServer {
    transport: WebSocketTransport,
    commands: CommandSender,
    limits: Limits,
}

impl NoughtsServer {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), NoughtsError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Each accepted socket gets its own task, which runs the WebSocket
    /// upgrade and then the handler. A failed accept is logged and skipped.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), NoughtsError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "noughts server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(incoming) => {
                        let commands = self.commands.clone();
                        let limits = self.limits;
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(incoming, commands, JsonCodec, limits).await
                            {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        // Live handlers still hold senders; the coordinator keeps serving
        // them and stops once the last one is gone.
        self.transport.shutdown().await?;
        Ok(())
    }
}
