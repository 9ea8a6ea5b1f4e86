//! WebSocket upgrade and per-viewer session plumbing for the telemetry
//! endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::hub::{Hub, ViewerSession, SESSION_BUFFER};

pub fn router(hub: Arc<Hub>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(hub)
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(hub): State<Arc<Hub>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, hub, remote))
}

async fn handle_socket(socket: WebSocket, hub: Arc<Hub>, remote: SocketAddr) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(SESSION_BUFFER);

    let session = Arc::new(ViewerSession::new(hub.next_session_id(), tx));
    info!(event = "viewer_connected", session_id = session.id(), remote = %remote);
    hub.register(session.clone()).await;

    // Writer task: drains the session queue onto the socket. A peer that
    // stops accepting writes flips the session closed so broadcasts skip it.
    let writer_session = session.clone();
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                writer_session.mark_closed();
                break;
            }
        }
    });

    // Read loop: viewers push nothing the hub acts on; we only watch for
    // the transport closing.
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(event = "viewer_read_error", session_id = session.id(), error = %err);
                break;
            }
        }
    }

    info!(event = "viewer_disconnected", session_id = session.id(), remote = %remote);
    hub.unregister(session.id()).await;
    writer.abort();
}
