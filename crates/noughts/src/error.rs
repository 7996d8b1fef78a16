//! Unified error type for the noughts server.

use noughts_protocol::ProtocolError;
use noughts_transport::TransportError;

/// Top-level error for a connection's lifetime.
///
/// `#[from]` on the wrapped variants lets `?` convert sub-crate errors
/// automatically. Rejected room operations never end up here; the
/// coordinator answers them with an `error` reply instead.
#[derive(Debug, thiserror::Error)]
pub enum NoughtsError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The WebSocket upgrade did not finish in time.
    #[error("handshake timed out")]
    HandshakeTimeout,

    /// The peer stopped reading and an outbound frame could not be
    /// written in time.
    #[error("send timed out")]
    SendTimeout,

    /// The coordinator task is gone; no more requests can be served.
    #[error("coordinator stopped")]
    CoordinatorStopped,
}
