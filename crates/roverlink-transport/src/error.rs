/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket is not open, so the frame was not queued.
    ///
    /// Sends are never retried; the caller decides what to do.
    #[error("socket is not open")]
    NotOpen,

    /// Opening the connection failed (DNS, TCP or WebSocket handshake).
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The endpoint is well-formed but the backend cannot serve it.
    /// Secure (`wss`, port 443) endpoints end up here by default.
    #[error("unsupported endpoint: {0}")]
    Unsupported(String),

    /// The endpoint could not be turned into a URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
