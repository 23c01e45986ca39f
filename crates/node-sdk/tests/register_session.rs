//! Integration tests: boot an in-process registration HTTP server and an
//! in-process websocket session server, then drive a real [`Node`] against
//! them through the full lifecycle:
//!
//! - registration carries the bearer token and declared identity
//! - a successful response populates the credential cell and the session
//!   connects with `?auth=<token>`
//! - invocations addressed to this node produce correlated results
//! - frames for other nodes and undecodable frames produce nothing
//! - a failing handler produces an error-shaped result, not silence
//! - a dropped session reconnects after the fixed delay without
//!   re-registering
//! - failed registrations leave the previous credential untouched

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use hurozo_node_sdk::{
    Credential, CredentialCell, HandlerError, InvocationResult, NodeBuilder, NodeConfig,
    NodeHandler, NodeIdentity, RegisterRequest, RegistrationClient, RegistrationError,
};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

// ── Test handler: greets, or fails on demand ────────────────────────────

struct GreetHandler;

#[async_trait::async_trait]
impl NodeHandler for GreetHandler {
    async fn invoke(&self, inputs: Map<String, Value>) -> Result<Map<String, Value>, HandlerError> {
        if inputs.contains_key("boom") {
            return Err(HandlerError::Failed("boom requested".into()));
        }
        let name = inputs.get("name").and_then(Value::as_str).unwrap_or("world");
        let mut outputs = Map::new();
        outputs.insert("greeting".into(), Value::String(format!("Hello {name}")));
        Ok(outputs)
    }
}

// ── Mock session server: in-process WS endpoint ─────────────────────────

/// Handle to one accepted websocket connection.
struct WsConn {
    /// Push raw text frames to the node.
    send: mpsc::Sender<String>,
    /// Text frames received from the node.
    recv: mpsc::Receiver<String>,
}

/// Boots a websocket listener on an ephemeral port.  Each accepted
/// connection is delivered on the returned channel as a [`WsConn`].
/// Dropping a `WsConn`'s sender closes that connection server-side.
async fn start_session_server() -> (SocketAddr, mpsc::Receiver<WsConn>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (conn_tx, conn_rx) = mpsc::channel(4);

    tokio::spawn(async move {
        while let Ok((stream, _peer)) = listener.accept().await {
            let conn_tx = conn_tx.clone();
            tokio::spawn(async move {
                let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                let (mut sink, mut stream) = ws.split();

                let (msg_tx, mut msg_rx) = mpsc::channel::<String>(16);
                let (reply_tx, reply_rx) = mpsc::channel::<String>(16);

                let _ = conn_tx
                    .send(WsConn {
                        send: msg_tx,
                        recv: reply_rx,
                    })
                    .await;

                let read_task = tokio::spawn(async move {
                    while let Some(Ok(msg)) = stream.next().await {
                        if let Message::Text(text) = msg {
                            let _ = reply_tx.send(text).await;
                        }
                    }
                });

                let write_task = tokio::spawn(async move {
                    while let Some(text) = msg_rx.recv().await {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    // Sender dropped by the test: close the connection.
                    let _ = sink.close().await;
                });

                let _ = tokio::join!(read_task, write_task);
            });
        }
    });

    (addr, conn_rx)
}

// ── Mock registration server ────────────────────────────────────────────

/// Boots a registration endpoint that hands out credentials pointing at
/// `ws_addr` and reports each captured request (auth header + body).
async fn start_registry(
    ws_addr: SocketAddr,
) -> (SocketAddr, mpsc::Receiver<(Option<String>, RegisterRequest)>) {
    let (seen_tx, seen_rx) = mpsc::channel(4);

    let app = Router::new().route(
        "/api/remote_nodes/register",
        post(move |headers: HeaderMap, Json(body): Json<RegisterRequest>| {
            let seen_tx = seen_tx.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                let _ = seen_tx.send((auth, body)).await;
                Json(serde_json::json!({
                    "websocket_url": format!("ws://{ws_addr}/session"),
                    "token": "tok-1",
                    "expires_in": 3600,
                }))
            }
        }),
    );

    let addr = serve(app).await;
    (addr, seen_rx)
}

/// Serve an axum router on an ephemeral port.
async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn next_reply(conn: &mut WsConn) -> InvocationResult {
    let text = timeout(Duration::from_secs(5), conn.recv.recv())
        .await
        .expect("timeout waiting for reply")
        .expect("connection dropped before reply");
    serde_json::from_str(&text).expect("reply should be an InvocationResult")
}

fn test_config(base_url: String) -> NodeConfig {
    let mut config = NodeConfig::new("secret");
    config.base_url = base_url;
    config
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_invoke_and_reconnect() {
    let (ws_addr, mut conn_rx) = start_session_server().await;
    let (reg_addr, mut reg_rx) = start_registry(ws_addr).await;

    let shutdown = CancellationToken::new();
    let node = NodeBuilder::new()
        .name("integration-node")
        .inputs(["name"])
        .outputs(["greeting"])
        .api_token("secret")
        .base_url(format!("http://{reg_addr}"))
        .recover_delay(Duration::from_millis(100))
        .build()
        .unwrap();
    let handle = node.spawn(GreetHandler, shutdown.clone());

    // ── Registration carries identity + bearer token ─────────────────
    let (auth, body) = timeout(Duration::from_secs(5), reg_rx.recv())
        .await
        .expect("timeout waiting for registration")
        .expect("registry closed");
    assert_eq!(auth.as_deref(), Some("Bearer secret"));
    assert_eq!(body.name, "integration-node");
    assert_eq!(body.inputs, vec!["name"]);
    assert_eq!(body.outputs, vec!["greeting"]);

    // ── Session connects with the issued credential ──────────────────
    let mut conn = timeout(Duration::from_secs(5), conn_rx.recv())
        .await
        .expect("timeout waiting for session")
        .expect("session server closed");

    // Frames for other nodes and undecodable frames produce nothing;
    // the next reply must correlate with the valid frame only.
    conn.send
        .send(r#"{"node": "someone-else", "inputs": {}, "uuid": "ux"}"#.into())
        .await
        .unwrap();
    conn.send.send("definitely not json".into()).await.unwrap();
    conn.send
        .send(r#"{"node": "integration-node", "inputs": {"name": "ada"}, "uuid": "u1"}"#.into())
        .await
        .unwrap();

    let reply = next_reply(&mut conn).await;
    assert_eq!(reply.node, "integration-node");
    assert_eq!(reply.uuid.as_deref(), Some("u1"));
    assert_eq!(
        reply.outputs.get("greeting"),
        Some(&Value::String("Hello ada".into()))
    );

    // ── Failing handler produces an error-shaped, correlated reply ───
    conn.send
        .send(r#"{"node": "integration-node", "inputs": {"boom": true}, "uuid": "u2"}"#.into())
        .await
        .unwrap();
    let reply = next_reply(&mut conn).await;
    assert_eq!(reply.uuid.as_deref(), Some("u2"));
    let error = reply.outputs.get("error").and_then(Value::as_str);
    assert!(
        error.is_some_and(|e| e.contains("boom")),
        "expected error outputs, got: {:?}",
        reply.outputs
    );

    // ── Drop the session: reconnect without re-registering ───────────
    drop(conn);

    let mut conn = timeout(Duration::from_secs(5), conn_rx.recv())
        .await
        .expect("timeout waiting for reconnect")
        .expect("session server closed");
    conn.send
        .send(r#"{"node": "integration-node", "inputs": {}, "uuid": "u3"}"#.into())
        .await
        .unwrap();
    let reply = next_reply(&mut conn).await;
    assert_eq!(reply.uuid.as_deref(), Some("u3"));
    assert_eq!(
        reply.outputs.get("greeting"),
        Some(&Value::String("Hello world".into()))
    );
    assert!(
        reg_rx.try_recv().is_err(),
        "reconnect must reuse the credential, not re-register"
    );

    // ── Shutdown ─────────────────────────────────────────────────────
    shutdown.cancel();
    let result = timeout(Duration::from_secs(5), handle)
        .await
        .expect("node did not stop on cancellation")
        .expect("node task panicked");
    assert!(result.is_ok());
}

#[tokio::test]
async fn repeated_registrations_converge_cell_to_latest() {
    let calls = Arc::new(AtomicUsize::new(0));
    let route_calls = calls.clone();
    let app = Router::new().route(
        "/api/remote_nodes/register",
        post(move || {
            let n = route_calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Json(serde_json::json!({
                    "websocket_url": "ws://127.0.0.1:1/session",
                    "token": format!("tok-{n}"),
                }))
            }
        }),
    );
    let addr = serve(app).await;

    let mut config = test_config(format!("http://{addr}"));
    config.register_interval = Duration::from_millis(20);
    let identity = NodeIdentity::new("n", ["a"], ["b"]);
    let cell = CredentialCell::new();
    let watch = cell.watch();
    let client = RegistrationClient::new(&config, &identity, cell).unwrap();

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(client.run(shutdown.clone()));

    // The cell must track the newest issued credential as cycles run.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if watch.snapshot().is_some_and(|c| c.token == "tok-2") {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "cell never converged to the latest credential, last: {:?}",
            watch.snapshot()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(calls.load(Ordering::SeqCst) >= 3);

    shutdown.cancel();
    let _ = timeout(Duration::from_secs(5), task).await;
}

#[tokio::test]
async fn failed_registration_leaves_credential_untouched() {
    let app = Router::new().route(
        "/api/remote_nodes/register",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(app).await;

    let config = test_config(format!("http://{addr}"));
    let identity = NodeIdentity::new("n", ["a"], ["b"]);
    let cell = CredentialCell::new();
    let previous = Credential {
        websocket_url: "ws://old/session".into(),
        token: "old-token".into(),
    };
    cell.publish(previous.clone());
    let watch = cell.watch();

    let client = RegistrationClient::new(&config, &identity, cell).unwrap();
    let err = client.register_once().await.unwrap_err();
    assert!(matches!(err, RegistrationError::Protocol(_)));
    assert_eq!(watch.snapshot(), Some(previous));
}

#[tokio::test]
async fn response_missing_token_is_a_protocol_error() {
    let app = Router::new().route(
        "/api/remote_nodes/register",
        post(|| async { Json(serde_json::json!({"websocket_url": "ws://a/session"})) }),
    );
    let addr = serve(app).await;

    let config = test_config(format!("http://{addr}"));
    let identity = NodeIdentity::new("n", Vec::<String>::new(), Vec::<String>::new());
    let client = RegistrationClient::new(&config, &identity, CredentialCell::new()).unwrap();

    let err = client.register_once().await.unwrap_err();
    assert!(matches!(err, RegistrationError::Protocol(_)));
}

#[tokio::test]
async fn unreachable_registry_is_a_transport_error() {
    // Bind then drop a listener so the port is very likely closed.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let config = test_config(format!("http://{addr}"));
    let identity = NodeIdentity::new("n", Vec::<String>::new(), Vec::<String>::new());
    let client = RegistrationClient::new(&config, &identity, CredentialCell::new()).unwrap();

    let err = client.register_once().await.unwrap_err();
    assert!(matches!(err, RegistrationError::Transport(_)));
}
