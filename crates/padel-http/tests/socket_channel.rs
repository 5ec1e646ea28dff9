//! socket.io push channel tests against an in-process websocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use padel_core::error::Error;
use padel_core::{BackendUrl, DynRecord, EntityName, PushChannel};
use padel_http::SocketIoChannel;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

type Server = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

async fn next_text(ws: &mut Server) -> String {
    while let Some(Ok(msg)) = ws.next().await {
        if let Message::Text(text) = msg {
            return text.as_str().to_string();
        }
    }
    panic!("client went away");
}

/// Accept one websocket client, play the socket.io server side, and return
/// every text frame the client sent.
async fn serve(events: Vec<&'static str>) -> (BackendUrl, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let backend = BackendUrl::new(format!("http://127.0.0.1:{}", port)).unwrap();

    let handle = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let mut received = Vec::new();

        ws.send(Message::Text(
            r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#.into(),
        ))
        .await
        .unwrap();
        received.push(next_text(&mut ws).await);

        ws.send(Message::Text(r#"40{"sid":"def"}"#.into())).await.unwrap();
        ws.send(Message::Text("2".into())).await.unwrap();
        received.push(next_text(&mut ws).await);

        for event in events {
            ws.send(Message::Text(event.into())).await.unwrap();
        }
        ws.send(Message::Text("41".into())).await.unwrap();

        // Drain until the client closes its side.
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
        received
    });

    (backend, handle)
}

#[tokio::test]
async fn test_handshake_and_events() {
    let (backend, server) = serve(vec![
        r#"42["user",{"data":{"_id":"u1"}}]"#,
        r#"42["sale",{"data":{"_id":"a1","total":150}}]"#,
        r#"42["sale",{"nodata":true}]"#,
        r#"42["sale",{"data":{"_id":"a2","total":20}}]"#,
    ])
    .await;

    let channel = SocketIoChannel::new(backend).without_reconnect();
    let stream = PushChannel::<DynRecord>::subscribe(&channel, &EntityName::sale()).unwrap();
    let items: Vec<_> = tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .unwrap();

    assert_eq!(items.len(), 3);
    let first = items[0].as_ref().unwrap();
    assert_eq!(first.entity, EntityName::sale());
    assert_eq!(first.record.id.as_str(), "a1");
    assert!(matches!(items[1], Err(Error::PushDecode(_))));
    assert_eq!(items[2].as_ref().unwrap().record.id.as_str(), "a2");

    let received = server.await.unwrap();
    assert_eq!(received, vec!["40".to_string(), "3".to_string()]);
}

#[tokio::test]
async fn test_connection_refused_yields_error_then_ends() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let backend = BackendUrl::new(format!("http://127.0.0.1:{}", port)).unwrap();
    let channel = SocketIoChannel::new(backend).without_reconnect();
    let mut stream = PushChannel::<DynRecord>::subscribe(&channel, &EntityName::sale()).unwrap();

    assert!(matches!(stream.next().await, Some(Err(Error::Transport(_)))));
    assert!(stream.next().await.is_none());
}
