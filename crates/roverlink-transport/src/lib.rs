//! Client transport layer for Roverlink.
//!
//! Provides the [`Transport`] trait plus the pieces every transport hands
//! back from a successful connect: a cloneable [`TransportHandle`] for
//! sending text frames and a stream of [`TransportEvent`]s describing
//! everything that happens on the socket.
//!
//! ```text
//! TransportHandle::send(text) ──→ writer task ──→ socket
//! socket ──→ reader task ──→ TransportEvent (Opened / Message / Error / Closed)
//! ```
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod endpoint;
mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use endpoint::{Endpoint, SecureEndpointPolicy, Target};
pub use error::TransportError;
pub use memory::{MemoryPeer, MemoryTransport};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketTransport;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

/// Something that happened on the socket, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket is open and frames can be sent.
    Opened,
    /// The socket closed. No further events follow.
    Closed { reason: String },
    /// A non-fatal problem was observed (bad frame, write failure).
    Error { info: String },
    /// A text frame arrived.
    Message(String),
}

/// Receiving half of a connection's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Opens connections to an [`Endpoint`].
pub trait Transport: Send + Sync + 'static {
    /// Connects to the endpoint.
    ///
    /// Implementations must emit [`TransportEvent::Opened`] before any
    /// message event.
    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> Result<Connection, TransportError>;
}

/// Sending half of a connection.
///
/// Cheap to clone; every clone feeds the same writer task, so frames go out
/// in the order `send` was called.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    outbound: Option<mpsc::UnboundedSender<String>>,
    connected: Arc<AtomicBool>,
}

impl TransportHandle {
    pub(crate) fn new(
        outbound: mpsc::UnboundedSender<String>,
        connected: Arc<AtomicBool>,
    ) -> Self {
        Self {
            outbound: Some(outbound),
            connected,
        }
    }

    /// A handle that was never connected and never will be.
    pub fn closed() -> Self {
        Self {
            outbound: None,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queues a text frame for sending.
    ///
    /// # Errors
    /// Returns [`TransportError::NotOpen`] if the socket is not open or the
    /// writer task has gone away.
    pub fn send(&self, text: impl Into<String>) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotOpen);
        }
        let outbound = self.outbound.as_ref().ok_or(TransportError::NotOpen)?;
        outbound
            .send(text.into())
            .map_err(|_| TransportError::NotOpen)
    }

    /// Returns `true` between the open and close events.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// A connected (or deliberately skipped) socket: the send handle plus the
/// event stream.
#[derive(Debug)]
pub struct Connection {
    handle: TransportHandle,
    events: EventReceiver,
}

impl Connection {
    pub(crate) fn new(handle: TransportHandle, events: EventReceiver) -> Self {
        Self { handle, events }
    }

    /// A permanently closed connection whose event stream is already over.
    pub fn closed() -> Self {
        let (_tx, events) = mpsc::unbounded_channel();
        Self {
            handle: TransportHandle::closed(),
            events,
        }
    }

    /// Returns the send handle.
    pub fn handle(&self) -> &TransportHandle {
        &self.handle
    }

    /// Splits into the send handle and the event stream.
    pub fn into_parts(self) -> (TransportHandle, EventReceiver) {
        (self.handle, self.events)
    }
}
