//! Integration tests for the WebSocket client transport.
//!
//! These tests run a real WebSocket server on a local port and dial it with
//! [`WebSocketTransport`], checking that frames flow both ways and that the
//! lifecycle events arrive in the right order.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use roverlink_transport::{
        Endpoint, SecureEndpointPolicy, TransportError, TransportEvent,
        WebSocketTransport,
    };
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a listener on a free port and returns it with its endpoint.
    async fn listen() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let port = listener.local_addr().expect("local addr").port();
        (listener, Endpoint::new("127.0.0.1", port))
    }

    async fn accept(listener: &TcpListener) -> ServerWs {
        let (stream, _) = listener.accept().await.expect("should accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("handshake should succeed")
    }

    #[tokio::test]
    async fn test_open_send_receive_and_close() {
        let (listener, endpoint) = listen().await;

        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;

            ws.send(Message::Text("hello from rover".into()))
                .await
                .unwrap();

            let msg = ws.next().await.unwrap().unwrap();
            assert_eq!(msg.into_text().unwrap().as_str(), "hello from console");

            ws.close(None).await.unwrap();
        });

        let conn = WebSocketTransport::open(&endpoint)
            .await
            .expect("should connect");
        let (handle, mut events) = conn.into_parts();

        assert!(handle.is_connected());
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Message("hello from rover".into()))
        );

        handle.send("hello from console").expect("send should queue");

        // The server closes after reading our frame.
        let closed = events.recv().await.expect("close event");
        assert!(matches!(closed, TransportEvent::Closed { .. }));
        assert!(!handle.is_connected());
        assert!(matches!(
            handle.send("too late"),
            Err(TransportError::NotOpen)
        ));

        server.await.expect("server task should finish");
    }

    #[tokio::test]
    async fn test_binary_frames_are_delivered_as_text() {
        let (listener, endpoint) = listen().await;

        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            ws.send(Message::Binary(br#"{"method":"x"}"#.to_vec().into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        });

        let (_handle, mut events) = WebSocketTransport::open(&endpoint)
            .await
            .unwrap()
            .into_parts();

        assert_eq!(events.recv().await, Some(TransportEvent::Opened));
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Message(r#"{"method":"x"}"#.into()))
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let (listener, endpoint) = listen().await;
        drop(listener);

        let result = WebSocketTransport::open(&endpoint).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }

    #[tokio::test]
    async fn test_secure_endpoint_rejected_by_default() {
        let endpoint = Endpoint::new("127.0.0.1", 443);
        let result = WebSocketTransport::open(&endpoint).await;
        assert!(matches!(result, Err(TransportError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_secure_endpoint_skip_yields_closed_connection() {
        let endpoint = Endpoint::new("127.0.0.1", 443)
            .with_policy(SecureEndpointPolicy::SkipConnection);

        let (handle, mut events) = WebSocketTransport::open(&endpoint)
            .await
            .expect("skip should not fail")
            .into_parts();

        assert!(!handle.is_connected());
        assert!(events.recv().await.is_none());
        assert!(matches!(handle.send("{}"), Err(TransportError::NotOpen)));
    }
}
