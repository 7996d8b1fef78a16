//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! Nothing above this module cares which format is used, it only needs
//! something that implements [`Codec`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{ClientMessage, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` lets one codec instance be shared by every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes an inbound client frame.
    ///
    /// Runs in two stages so the client can be told *why* a frame was
    /// refused: first only the `type` tag is read, then the full record.
    ///
    /// - not a record / no `type` → [`ProtocolError::Decode`] or
    ///   [`ProtocolError::InvalidMessage`]
    /// - a `type` we don't know → [`ProtocolError::UnknownType`]
    /// - a known `type` with bad fields → [`ProtocolError::Decode`]
    fn decode_client(&self, data: &[u8]) -> Result<ClientMessage, ProtocolError> {
        let probe: TypeProbe = self.decode(data)?;
        let kind = probe
            .kind
            .ok_or_else(|| ProtocolError::InvalidMessage("missing `type` field".into()))?;
        if !ClientMessage::KINDS.contains(&kind.as_str()) {
            return Err(ProtocolError::UnknownType(kind));
        }
        self.decode(data)
    }
}

/// Reads just the discriminator of a record, ignoring everything else.
#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "type")]
    kind: Option<String>,
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browser clients speak JSON natively, and the frames stay readable in
/// DevTools.
///
/// ## Example
///
/// ```rust
/// use noughts_protocol::{ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg = codec.decode_client(br#"{"type":"getRooms"}"#).unwrap();
/// assert_eq!(msg, ClientMessage::GetRooms);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl JsonCodec {
    /// Encodes a value straight to a `String`, for text frames.
    pub fn encode_text<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }
}

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
