//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a plain `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use bingo_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type Client =
        tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

    /// Binds on a random port, connects one client, and returns both ends.
    async fn connected_pair() -> (WebSocketConnection, Client) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let conn = server.await.expect("task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let (conn, mut client) = connected_pair().await;
        assert!(conn.id().into_inner() > 0);

        // JSON goes out as a text frame.
        conn.send(br#"{"hello":"client"}"#).await.unwrap();
        match client.next().await.unwrap().unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), r#"{"hello":"client"}"#),
            other => panic!("expected text frame, got {other:?}"),
        }

        // Non-UTF-8 goes out as binary.
        conn.send(&[0xff, 0x00]).await.unwrap();
        assert!(matches!(client.next().await.unwrap().unwrap(), Message::Binary(_)));

        // Text and binary frames are both accepted inbound.
        client
            .send(Message::Text(r#"{"hello":"server"}"#.to_string().into()))
            .await
            .unwrap();
        client
            .send(Message::Binary(b"raw".to_vec().into()))
            .await
            .unwrap();
        assert_eq!(conn.recv().await.unwrap().unwrap(), br#"{"hello":"server"}"#);
        assert_eq!(conn.recv().await.unwrap().unwrap(), b"raw");

        conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (conn, mut client) = connected_pair().await;
        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_send_while_recv_is_pending() {
        let (conn, mut client) = connected_pair().await;
        let conn = Arc::new(conn);

        // Park a reader on the connection; nothing is coming yet.
        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A push must not wait for the reader.
        tokio::time::timeout(Duration::from_secs(1), conn.send(b"pushed"))
            .await
            .expect("send blocked behind recv")
            .unwrap();
        let pushed = client.next().await.unwrap().unwrap();
        assert_eq!(pushed.into_data().as_ref(), b"pushed");

        client.send(Message::Text("late".to_string().into())).await.unwrap();
        let got = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(got, b"late");
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (a, _ca) = connected_pair().await;
        let (b, _cb) = connected_pair().await;
        assert_ne!(a.id(), b.id());
        assert!(a.peer_addr().ip().is_loopback());
    }
}
