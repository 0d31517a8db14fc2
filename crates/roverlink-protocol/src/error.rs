//! Error types for the protocol layer.
//!
//! Everything that can go wrong between a text frame and a typed message
//! lands here. None of these are fatal for a session: inbound failures are
//! logged and the frame is dropped.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Valid JSON, but not one of the three envelope shapes.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A server call named a method this client does not handle.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A known method arrived with parameters of the wrong shape.
    #[error("invalid params for {method}: {reason}")]
    InvalidParams {
        /// The method being decoded.
        method: String,
        /// What was wrong with the parameters.
        reason: String,
    },
}
