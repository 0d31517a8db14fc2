//! Unified error type for the Roverlink client.

use roverlink_protocol::ProtocolError;
use roverlink_session::SessionError;
use roverlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `roverlink` crate you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]` attribute
/// on each variant generates the `From` impls, so `?` converts sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoverError {
    /// Connecting failed, or a frame could not be sent.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A call could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session precondition failed (identity timeout or unavailable).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client task has stopped.
    #[error("client has shut down")]
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: RoverError =
            TransportError::Unsupported("wss://rover:443/rover".into()).into();
        assert!(matches!(err, RoverError::Transport(_)));
        assert!(err.to_string().contains("wss://rover:443/rover"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: RoverError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, RoverError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: RoverError = SessionError::IdentityTimeout.into();
        assert!(matches!(err, RoverError::Session(_)));
    }

    #[test]
    fn test_shutdown_message() {
        assert_eq!(RoverError::Shutdown.to_string(), "client has shut down");
    }
}
