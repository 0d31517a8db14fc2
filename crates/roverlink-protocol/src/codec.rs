//! Codecs and request id allocation.
//!
//! [`Codec`] is the serialization strategy (JSON today via [`JsonCodec`]).
//! [`MessageCodec`] is what a session actually holds: a codec plus the
//! [`RequestIds`] allocator, turning [`ClientCall`]s into text frames and
//! text frames into [`Inbound`] envelopes.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{ClientCall, Inbound, OutboundCall, ProtocolError, RequestId};

/// A codec that can encode Rust types to bytes and decode bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// RequestIds
// ---------------------------------------------------------------------------

/// Monotonic request id allocator.
///
/// The first id handed out is 1. Ids are never reused for the lifetime of
/// the allocator.
#[derive(Debug, Default)]
pub struct RequestIds {
    last: u64,
}

impl RequestIds {
    /// Creates an allocator that has not handed out any id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id.
    pub fn next(&mut self) -> RequestId {
        self.last += 1;
        RequestId(self.last)
    }

    /// The most recently allocated id, `RequestId(0)` before the first.
    pub fn last(&self) -> RequestId {
        RequestId(self.last)
    }
}

// ---------------------------------------------------------------------------
// MessageCodec
// ---------------------------------------------------------------------------

/// Text-frame codec for one session.
#[derive(Debug, Default)]
pub struct MessageCodec<C: Codec = JsonCodec> {
    ids: RequestIds,
    codec: C,
}

impl MessageCodec<JsonCodec> {
    /// Creates a JSON message codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Codec> MessageCodec<C> {
    /// Creates a message codec over a custom codec.
    pub fn with_codec(codec: C) -> Self {
        Self {
            ids: RequestIds::new(),
            codec,
        }
    }

    /// Allocates an id and serializes the call.
    ///
    /// The id is consumed even if serialization fails, so ids stay unique.
    pub fn encode(
        &mut self,
        call: &ClientCall,
    ) -> Result<(String, RequestId), ProtocolError> {
        let id = self.ids.next();
        let envelope = OutboundCall::new(call.method(), call.params(), id);
        let bytes = self.codec.encode(&envelope)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            ProtocolError::InvalidMessage(format!("encoded frame: {e}"))
        })?;
        Ok((text, id))
    }

    /// Parses a text frame into an envelope.
    pub fn decode(&self, text: &str) -> Result<Inbound, ProtocolError> {
        let value: Value = self.codec.decode(text.as_bytes())?;
        Inbound::from_value(value)
    }

    /// The most recently allocated request id.
    pub fn last_id(&self) -> RequestId {
        self.ids.last()
    }
}
