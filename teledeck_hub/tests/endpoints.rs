//! End-to-end coverage: a real hub with both listeners, a
//! tokio-tungstenite viewer, and raw HTTP against the ingestion surface.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

use teledeck_hub::hub::Hub;
use teledeck_hub::snapshot::{CpuSample, Frame, GpuSample, MemorySample, TelemetrySnapshot};
use teledeck_hub::{ingest, ws};

const GIB: u64 = 1024 * 1024 * 1024;

async fn start_hub() -> (Arc<Hub>, SocketAddr, SocketAddr) {
    let hub = Arc::new(Hub::new());

    let ws_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = ws_listener.local_addr().unwrap();
    let ws_app = ws::router(hub.clone()).into_make_service_with_connect_info::<SocketAddr>();
    tokio::spawn(async move {
        axum::serve(ws_listener, ws_app).await.unwrap();
    });

    let ingest_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ingest_addr = ingest_listener.local_addr().unwrap();
    let ingest_app = ingest::router(hub.clone());
    tokio::spawn(async move {
        axum::serve(ingest_listener, ingest_app).await.unwrap();
    });

    (hub, ws_addr, ingest_addr)
}

async fn connect_viewer(
    hub: &Arc<Hub>,
    ws_addr: SocketAddr,
) -> tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>> {
    let sessions_before = hub.session_count().await;
    let (viewer, _) = tokio_tungstenite::connect_async(format!("ws://{ws_addr}/ws"))
        .await
        .unwrap();
    // Registration races the handshake; wait until the hub sees the session.
    timeout(Duration::from_secs(5), async {
        while hub.session_count().await == sessions_before {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session registered");
    viewer
}

async fn http_request(addr: SocketAddr, raw: String) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

fn post(body: &str, path: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\nHost: teledeck\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn sample_snapshot() -> TelemetrySnapshot {
    TelemetrySnapshot {
        cpu: CpuSample { usage_percent: 41 },
        memory: MemorySample::from_bytes(6 * GIB, 8 * GIB),
        gpu: GpuSample {
            name: "RTX 4070".into(),
            usage_percent: Some(22),
            vram_total_gb: "12.0".into(),
        },
    }
}

#[tokio::test]
async fn viewer_receives_both_envelope_shapes() {
    let (hub, ws_addr, _ingest_addr) = start_hub().await;
    let mut viewer = connect_viewer(&hub, ws_addr).await;

    hub.broadcast(&Frame::agent_update(json!({"status": "busy", "pid": 4992})))
        .await;
    let Message::Text(text) = viewer.next().await.unwrap().unwrap() else {
        panic!("expected a text frame");
    };
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["type"], "AGENT_UPDATE");
    assert_eq!(v["data"], json!({"status": "busy", "pid": 4992}));

    hub.broadcast(&Frame::telemetry(sample_snapshot())).await;
    let Message::Text(text) = viewer.next().await.unwrap().unwrap() else {
        panic!("expected a text frame");
    };
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["type"], "HARDWARE_TELEMETRY");
    assert_eq!(v["data"]["memory"]["usedGB"], "6.0");
    assert_eq!(v["data"]["gpu"]["name"], "RTX 4070");
    assert!(v["timestamp"].is_string());
}

#[tokio::test]
async fn ingestion_round_trips_to_the_viewer_over_http() {
    let (hub, ws_addr, ingest_addr) = start_hub().await;
    let mut viewer = connect_viewer(&hub, ws_addr).await;

    let resp = http_request(
        ingest_addr,
        post(r#"{"status":"busy","pid":4992}"#, "/agent-update"),
    )
    .await;
    assert!(resp.starts_with("HTTP/1.1 200"), "unexpected response: {resp}");
    assert!(resp.contains("Update broadcasted"));

    let Message::Text(text) = viewer.next().await.unwrap().unwrap() else {
        panic!("expected a text frame");
    };
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["type"], "AGENT_UPDATE");
    assert_eq!(v["data"], json!({"status": "busy", "pid": 4992}));
}

#[tokio::test]
async fn malformed_ingestion_yields_400() {
    let (_hub, _ws_addr, ingest_addr) = start_hub().await;
    let resp = http_request(ingest_addr, post("not json", "/agent-update")).await;
    assert!(resp.starts_with("HTTP/1.1 400"), "unexpected response: {resp}");
    assert!(resp.contains("Invalid JSON"));
}

#[tokio::test]
async fn unknown_paths_and_methods_yield_404() {
    let (_hub, _ws_addr, ingest_addr) = start_hub().await;

    let resp = http_request(
        ingest_addr,
        "GET /agent-update HTTP/1.1\r\nHost: teledeck\r\nConnection: close\r\n\r\n".to_string(),
    )
    .await;
    assert!(resp.starts_with("HTTP/1.1 404"), "unexpected response: {resp}");

    let resp = http_request(ingest_addr, post("{}", "/some-other-path")).await;
    assert!(resp.starts_with("HTTP/1.1 404"), "unexpected response: {resp}");
}

#[tokio::test]
async fn late_viewer_misses_earlier_frames() {
    let (hub, ws_addr, _ingest_addr) = start_hub().await;

    // Broadcast before anyone is connected: point-in-time, no backlog.
    hub.broadcast(&Frame::agent_update(json!({"seq": 1}))).await;

    let mut viewer = connect_viewer(&hub, ws_addr).await;
    hub.broadcast(&Frame::agent_update(json!({"seq": 2}))).await;

    let Message::Text(text) = viewer.next().await.unwrap().unwrap() else {
        panic!("expected a text frame");
    };
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["data"]["seq"], 2, "late viewer must only see frames after connect");
}
