//! Error types for the session layer.

use roverlink_protocol::ProtocolError;
use roverlink_transport::TransportError;

/// Errors surfaced by session operations.
///
/// Inbound problems (bad frames, unknown methods, backend error responses)
/// never show up here; they are logged or collected in the store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The frame could not be sent.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The call could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The backend did not assign an identity in time.
    #[error("backend did not assign a client id in time")]
    IdentityTimeout,

    /// The operation needs an identity and none has been assigned yet.
    #[error("client id not assigned yet")]
    IdentityUnavailable,

    /// The session was dropped before the outcome was known.
    #[error("session closed")]
    Closed,
}
