//! WebSocket client transport using `tokio-tungstenite`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::{
    Connection, Endpoint, Target, Transport, TransportError, TransportEvent,
    TransportHandle,
};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A [`Transport`] that dials the backend over WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Connects to the endpoint and spawns the reader and writer tasks.
    ///
    /// Under [`SecureEndpointPolicy::SkipConnection`](crate::SecureEndpointPolicy)
    /// a secure endpoint yields [`Connection::closed`] without dialing.
    pub async fn open(
        endpoint: &Endpoint,
    ) -> Result<Connection, TransportError> {
        let url = match endpoint.target()? {
            Target::Url(url) => url,
            Target::Skip => {
                tracing::warn!(
                    %endpoint,
                    "secure endpoint not served by backend, skipping connection"
                );
                return Ok(Connection::closed());
            }
        };

        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| {
                TransportError::ConnectFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let (sink, stream) = ws.split();
        let connected = Arc::new(AtomicBool::new(true));
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tracing::info!(%url, "connection open");
        let _ = event_tx.send(TransportEvent::Opened);

        tokio::spawn(write_loop(sink, out_rx, event_tx.clone()));
        tokio::spawn(read_loop(stream, event_tx, Arc::clone(&connected)));

        Ok(Connection::new(
            TransportHandle::new(out_tx, connected),
            event_rx,
        ))
    }
}

impl Transport for WebSocketTransport {
    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> Result<Connection, TransportError> {
        Self::open(endpoint).await
    }
}

/// Drains queued frames onto the socket. Ends (and closes the socket) once
/// every [`TransportHandle`] has been dropped.
async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(text) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            tracing::debug!(error = %e, "websocket write failed");
            let _ = events.send(TransportEvent::Error {
                info: e.to_string(),
            });
            return;
        }
    }
    let _ = sink.close().await;
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    events: mpsc::UnboundedSender<TransportEvent>,
    connected: Arc<AtomicBool>,
) {
    let reason = loop {
        let event = match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                TransportEvent::Message(text.as_str().to_owned())
            }
            Some(Ok(Message::Binary(data))) => {
                match String::from_utf8(data.to_vec()) {
                    Ok(text) => TransportEvent::Message(text),
                    Err(e) => TransportEvent::Error {
                        info: format!("binary frame is not utf-8: {e}"),
                    },
                }
            }
            Some(Ok(Message::Close(frame))) => {
                break frame
                    .map(|f| f.reason.as_str().to_owned())
                    .unwrap_or_default();
            }
            Some(Ok(_)) => continue, // ping/pong/raw frame
            Some(Err(e)) => {
                tracing::debug!(error = %e, "websocket read failed");
                let _ = events.send(TransportEvent::Error {
                    info: e.to_string(),
                });
                break e.to_string();
            }
            None => break "stream ended".to_string(),
        };
        if events.send(event).is_err() {
            break "event receiver dropped".to_string();
        }
    };

    connected.store(false, Ordering::Release);
    tracing::info!(%reason, "connection closed");
    let _ = events.send(TransportEvent::Closed { reason });
}
