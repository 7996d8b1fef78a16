//! Error types for the protocol layer.
//!
//! Each crate in the workspace has its own error enum. A `ProtocolError`
//! always means "these bytes could not be turned into a message" (or the
//! reverse), never a networking or game-rule problem.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or
    /// wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but its `type` tag is not one we know.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The message is invalid at the protocol level, e.g. it has no
    /// `type` field at all.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// The text sent back to the client in an `error` reply.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::UnknownType(_) => "Unknown message type",
            _ => "Invalid message format",
        }
    }
}
