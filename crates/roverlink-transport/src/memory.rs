//! In-process transport.
//!
//! [`MemoryTransport::pair`] returns a [`Connection`] for the session side
//! and a [`MemoryPeer`] that plays the backend: it sees every frame the
//! session sends and injects socket events by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::{Connection, TransportEvent, TransportHandle};

/// Factory for in-process connection pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryTransport;

impl MemoryTransport {
    /// Creates a connected pair. The socket starts closed; call
    /// [`MemoryPeer::open`] to open it.
    pub fn pair() -> (Connection, MemoryPeer) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        let handle = TransportHandle::new(out_tx, Arc::clone(&connected));
        let peer = MemoryPeer {
            outbound: out_rx,
            events: event_tx,
            connected,
        };
        (Connection::new(handle, event_rx), peer)
    }
}

/// The far side of a [`MemoryTransport`] pair.
#[derive(Debug)]
pub struct MemoryPeer {
    outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
    connected: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// Opens the socket and emits [`TransportEvent::Opened`].
    pub fn open(&self) {
        self.connected.store(true, Ordering::Release);
        let _ = self.events.send(TransportEvent::Opened);
    }

    /// Delivers an inbound text frame.
    pub fn deliver(&self, text: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Message(text.into()));
    }

    /// Emits a non-fatal error event.
    pub fn fail(&self, info: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Error { info: info.into() });
    }

    /// Closes the socket and emits [`TransportEvent::Closed`].
    pub fn close(&self, reason: impl Into<String>) {
        self.connected.store(false, Ordering::Release);
        let _ = self.events.send(TransportEvent::Closed {
            reason: reason.into(),
        });
    }

    /// Waits for the next frame the session sent.
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Returns the next already-sent frame, if any.
    pub fn try_recv(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }

    /// Returns every frame sent so far.
    pub fn drain(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }
}
