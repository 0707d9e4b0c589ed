//! Session against a real WebSocket server on localhost.
#![cfg(feature = "websocket")]

use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use param_panel::transport::TransportState;
use param_panel::widgets::Widget;
use param_panel::ws::WsConnector;
use param_panel::Session;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Pumps the session until `done` holds or the deadline passes.
fn pump_until(session: &mut Session, done: impl Fn(&Session) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        session.pump();
        if done(session) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn round_trip_over_websocket() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let listener = runtime
        .block_on(TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<String>();

    runtime.spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { continue };
            let _ = seen_tx.send(text.clone());
            if text == "send_interface" {
                let interface = json!({ "type": "interface", "content": [
                    { "id": "gain", "name": "Gain", "type": "parameter", "valueType": "i", "value": 2, "min": 0, "max": 8 }
                ]});
                ws.send(Message::Text(interface.to_string())).await.unwrap();
                let update = json!({ "type": "update", "content": [{ "id": "gain", "value": 6 }] });
                ws.send(Message::Text(update.to_string())).await.unwrap();
            } else if text.starts_with('{') {
                ws.close(None).await.unwrap();
            }
        }
    });

    let connector = WsConnector::new(runtime.handle().clone());
    let mut session = Session::connect(&format!("http://127.0.0.1:{port}/"), Some(&connector));

    let mounted = pump_until(&mut session, |session| {
        matches!(session.find("gain"), Some(Widget::Integer(control)) if control.value() == 6)
    });
    assert!(mounted, "interface and update should arrive, got {session:?}");
    assert_eq!(session.state(), TransportState::Open);

    session.interact("gain", |widget, outbox| {
        if let Widget::Integer(control) = widget {
            control.set_from_user(3, outbox);
        }
    });

    let closed = pump_until(&mut session, |session| session.state() == TransportState::Closed);
    assert!(closed, "server closes after the edit");
    assert_eq!(session.alerts().len(), 1);

    let mut seen = Vec::new();
    while let Ok(text) = seen_rx.try_recv() {
        seen.push(serde_json::from_str(&text).unwrap_or(json!(text)));
    }
    assert_eq!(
        seen,
        vec![
            json!("send_interface"),
            json!({ "type": "update", "content": [{ "id": "gain", "value": 3 }] }),
        ]
    );
}

#[test]
fn refused_connection_closes_with_alert() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    // bind then drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let connector = WsConnector::new(runtime.handle().clone());
    let mut session = Session::connect(&format!("http://127.0.0.1:{port}/"), Some(&connector));
    assert_eq!(session.state(), TransportState::Connecting);

    let closed = pump_until(&mut session, |session| session.state() == TransportState::Closed);
    assert!(closed);
    assert_eq!(session.alerts().len(), 1);
    assert!(session.alerts()[0].message.starts_with("Connection is closed"));
}
