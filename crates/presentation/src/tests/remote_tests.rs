use axum::{
    extract::ws::{Message as WsMessage, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};

use super::*;
use crate::test_support::ceremony_data;

#[test]
fn events_url_swaps_scheme_and_path() {
    assert_eq!(
        events_url("http://127.0.0.1:3005").expect("http").as_str(),
        "ws://127.0.0.1:3005/ws"
    );
    assert_eq!(
        events_url("https://awards.example/api?x=1").expect("https").as_str(),
        "wss://awards.example/ws"
    );
    assert!(events_url("ftp://awards.example").is_err());
    assert!(events_url("not a url").is_err());
}

#[test]
fn photo_update_event_patches_roster() {
    let roster = Roster::new(ceremony_data()).expect("roster");
    let event = ServerEvent::PhotoUpdated {
        winner_id: WinnerId(12),
        photo_url: "http://127.0.0.1:3005/files/x.png".to_string(),
    };
    assert_eq!(apply_server_event(&roster, &event), Some(WinnerId(12)));
    assert_eq!(
        roster.get_by_id(WinnerId(12)).expect("winner").photo(),
        Some("http://127.0.0.1:3005/files/x.png")
    );
}

#[test]
fn unknown_winner_and_deletions_change_nothing() {
    let roster = Roster::new(ceremony_data()).expect("roster");
    let before = roster.winners();

    let unknown = ServerEvent::PhotoUpdated {
        winner_id: WinnerId(404),
        photo_url: "x".to_string(),
    };
    assert_eq!(apply_server_event(&roster, &unknown), None);
    let deleted = ServerEvent::PhotoDeleted {
        filename: "x.png".to_string(),
    };
    assert_eq!(apply_server_event(&roster, &deleted), None);
    assert_eq!(roster.winners(), before);
}

async fn push_one_update(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        let event = ServerEvent::PhotoUpdated {
            winner_id: WinnerId(3),
            photo_url: "http://127.0.0.1:3005/files/three.jpg".to_string(),
        };
        let text = serde_json::to_string(&event).expect("event json");
        let _ = socket.send(WsMessage::Text("not json".to_string())).await;
        let _ = socket.send(WsMessage::Text(text)).await;
        let _ = socket.send(WsMessage::Close(None)).await;
    })
}

#[tokio::test]
async fn follows_updates_over_websocket() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route("/ws", get(push_one_update));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let roster = Arc::new(Roster::new(ceremony_data()).expect("roster"));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let feed = follow_photo_updates(&format!("http://{addr}"), roster.clone(), tx)
        .await
        .expect("connect");

    assert_eq!(rx.recv().await, Some(WinnerId(3)));
    feed.await.expect("feed task");
    assert_eq!(
        roster.get_by_id(WinnerId(3)).expect("winner").photo(),
        Some("http://127.0.0.1:3005/files/three.jpg")
    );
}
