//! Integration tests: pushline over a local HTTP/2 server.
//!
//! Each test starts an `h2` server on a loopback port (plain TCP, prior
//! knowledge), advertising a small MAX_CONCURRENT_STREAMS, and drives a
//! pushline client through `H2Transport::plain`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use pushline::{
    Client, ClientConfig, Error, Notification, Outcome, Payload, Priority, PushRequest, Reason,
    RetryPolicy, StreamTransport, TransportError, UnitError,
};
use pushline_h2::H2Transport;
use tokio::net::TcpListener;

const TOPIC: &str = "com.example.App";

// ── Test server ─────────────────────────────────────────────────────────

/// A request as seen by the server.
#[derive(Debug, Clone)]
struct Captured {
    method: String,
    path: String,
    topic: Option<String>,
    priority: Option<String>,
    body: Vec<u8>,
}

#[derive(Default)]
struct ServerState {
    active: AtomicUsize,
    peak: AtomicUsize,
    captured: Mutex<Vec<Captured>>,
}

/// Start a server advertising `max_streams`. Tokens starting with `bad`
/// are rejected with `BadDeviceToken`, `gone` with `Unregistered`, `odd`
/// with an unknown reason; everything else succeeds.
async fn start_server(max_streams: u32) -> (SocketAddr, Arc<ServerState>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(ServerState::default());

    let server_state = state.clone();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let state = server_state.clone();
            tokio::spawn(async move {
                let mut conn = h2::server::Builder::new()
                    .max_concurrent_streams(max_streams)
                    .handshake::<_, Bytes>(socket)
                    .await
                    .unwrap();
                while let Some(accepted) = conn.accept().await {
                    let Ok((request, respond)) = accepted else {
                        break;
                    };
                    tokio::spawn(handle(request, respond, state.clone()));
                }
            });
        }
    });

    (addr, state)
}

async fn handle(
    request: http::Request<h2::RecvStream>,
    mut respond: h2::server::SendResponse<Bytes>,
    state: Arc<ServerState>,
) {
    let active = state.active.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak.fetch_max(active, Ordering::SeqCst);

    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let topic = header("apns-topic");
    let priority = header("apns-priority");

    let mut recv = request.into_body();
    let mut body = Vec::new();
    while let Some(chunk) = recv.data().await {
        let chunk = chunk.unwrap();
        let _ = recv.flow_control().release_capacity(chunk.len());
        body.extend_from_slice(&chunk);
    }

    // Hold the stream open briefly so several overlap.
    tokio::time::sleep(Duration::from_millis(5)).await;

    let token = path.trim_start_matches("/3/device/").to_string();
    state.captured.lock().unwrap().push(Captured {
        method,
        path,
        topic,
        priority,
        body,
    });

    let rejection = if token.starts_with("bad") {
        Some((400, r#"{"reason":"BadDeviceToken"}"#))
    } else if token.starts_with("gone") {
        Some((410, r#"{"reason":"Unregistered","timestamp":1454402113}"#))
    } else if token.starts_with("odd") {
        Some((400, r#"{"reason":"FromTheFuture"}"#))
    } else {
        None
    };

    state.active.fetch_sub(1, Ordering::SeqCst);
    match rejection {
        None => {
            let response = http::Response::builder().status(200).body(()).unwrap();
            respond.send_response(response, true).unwrap();
        }
        Some((status, json)) => {
            let response = http::Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(())
                .unwrap();
            let mut send = respond.send_response(response, false).unwrap();
            send.send_data(Bytes::from_static(json.as_bytes()), true).unwrap();
        }
    }
}

fn client_for(addr: SocketAddr) -> Client<H2Transport> {
    Client::new(H2Transport::plain(addr.ip().to_string(), addr.port()))
}

fn batch(tokens: &[String]) -> Vec<Notification> {
    tokens
        .iter()
        .map(|t| Notification::new(t.as_str(), Payload::new().alert("Hello, world!")))
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_observes_peer_limit() {
    let (addr, _) = start_server(7).await;
    let mut transport = H2Transport::plain(addr.ip().to_string(), addr.port());

    assert!(!transport.is_connected());
    transport.connect().await.unwrap();
    assert!(transport.is_connected());
    assert_eq!(transport.peer_max_concurrent_streams(), Some(7));
}

#[tokio::test]
async fn batch_round_trip() {
    let (addr, state) = start_server(4).await;
    let mut client = client_for(addr);

    let mut tokens: Vec<String> = (0..40).map(|i| format!("{i:064x}")).collect();
    tokens.push("bad0".into());
    tokens.push("gone0".into());
    tokens.push("odd0".into());

    let results = client
        .send_batch(batch(&tokens), TOPIC, Priority::Immediate)
        .await
        .unwrap();

    assert_eq!(results.len(), tokens.len());
    assert_eq!(client.effective_window(), Some(4));
    assert!(state.peak.load(Ordering::SeqCst) <= 4);
    assert_eq!(client.transport().pending_count(), 0);

    for token in &tokens[..40] {
        assert_eq!(results[token], Ok(Outcome::Success));
    }
    assert_eq!(results["bad0"], Ok(Outcome::Failure(Reason::BadDeviceToken)));
    assert_eq!(results["gone0"], Ok(Outcome::Failure(Reason::Unregistered)));
    assert_eq!(
        results["odd0"],
        Err(UnitError::UnknownReason("FromTheFuture".into()))
    );
}

#[tokio::test]
async fn malformed_token_is_recorded_per_token() {
    let (addr, state) = start_server(4).await;
    let mut client = client_for(addr);

    let tokens: Vec<String> = ["aa", "bb", "bad token", "cc"]
        .into_iter()
        .map(String::from)
        .collect();
    let results = client
        .send_batch(batch(&tokens), TOPIC, Priority::Immediate)
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(results["aa"], Ok(Outcome::Success));
    assert_eq!(results["bb"], Ok(Outcome::Success));
    assert_eq!(results["cc"], Ok(Outcome::Success));
    assert_eq!(
        results["bad token"],
        Err(UnitError::InvalidToken("bad token".into()))
    );

    assert!(client.transport().is_connected());
    assert_eq!(client.transport().pending_count(), 0);
    assert_eq!(state.captured.lock().unwrap().len(), 3);

    // The connection is still usable afterwards.
    let next = Notification::new("dd", Payload::new().alert("again"));
    let outcome = client.send(&next, TOPIC, Priority::Immediate).await.unwrap();
    assert_eq!(outcome, Outcome::Success);
}

#[tokio::test]
async fn unbuildable_request_keeps_connection() {
    let (addr, _) = start_server(4).await;
    let mut transport = H2Transport::plain(addr.ip().to_string(), addr.port());
    transport.connect().await.unwrap();

    let good = PushRequest::new(
        &Notification::new("aa", Payload::new().alert("hi")),
        TOPIC,
        Priority::Immediate,
    )
    .unwrap();
    let mut broken = good.clone();
    broken.path = "/3/device/bad token".into();

    let err = transport.open_stream(broken).await.unwrap_err();
    assert!(matches!(err, TransportError::Protocol(_)));
    assert!(transport.is_connected());
    assert_eq!(transport.pending_count(), 0);

    let stream = transport.open_stream(good).await.unwrap();
    let response = transport.await_response(stream).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn request_wire_format() {
    let (addr, state) = start_server(10).await;
    let mut client = client_for(addr);

    let notification = Notification::new("00fc13adff78", Payload::new().alert("héllo").badge(2));
    let outcome = client
        .send(&notification, TOPIC, Priority::Delayed)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Success);

    let outcome = client
        .send(&notification, TOPIC, Priority::Immediate)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Success);

    let captured = state.captured.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);

    let delayed = &captured[0];
    assert_eq!(delayed.method, "POST");
    assert_eq!(delayed.path, "/3/device/00fc13adff78");
    assert_eq!(delayed.topic.as_deref(), Some(TOPIC));
    assert_eq!(delayed.priority.as_deref(), Some("5"));
    assert_eq!(
        String::from_utf8(delayed.body.clone()).unwrap(),
        r#"{"aps":{"alert":"héllo","badge":2}}"#
    );
    let json: serde_json::Value = serde_json::from_slice(&delayed.body).unwrap();
    assert_eq!(json["aps"]["badge"], 2);

    let immediate = &captured[1];
    assert_eq!(immediate.priority, None);
    assert_eq!(immediate.topic.as_deref(), Some(TOPIC));
}

#[tokio::test]
async fn send_async_out_of_order() {
    let (addr, _) = start_server(10).await;
    let mut client = client_for(addr);

    let good = Notification::new("good", Payload::new().alert("a"));
    let bad = Notification::new("bad1", Payload::new().alert("b"));
    let first = client.send_async(&good, TOPIC, Priority::Immediate).await.unwrap();
    let second = client.send_async(&bad, TOPIC, Priority::Immediate).await.unwrap();
    assert_eq!(client.transport().pending_count(), 2);

    assert_eq!(
        client.result(second).await.unwrap(),
        Outcome::Failure(Reason::BadDeviceToken)
    );
    assert_eq!(client.result(first).await.unwrap(), Outcome::Success);
}

#[tokio::test]
async fn unreachable_server_fails_after_retries() {
    // Bind and release a port so nothing is listening on it.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let config = ClientConfig {
        connect: RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(5),
        },
        ..Default::default()
    };
    let transport = H2Transport::plain(addr.ip().to_string(), addr.port());
    let mut client = Client::with_config(transport, config).unwrap();

    let tokens = vec!["a".to_string()];
    let err = client
        .send_batch(batch(&tokens), TOPIC, Priority::Immediate)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connection { attempts: 3, .. }));
    assert_eq!(client.transport().pending_count(), 0);
}
