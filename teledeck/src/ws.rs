//! Minimal WebSocket client plumbing for the viewer session.

use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Connect to the hub and return the WS stream
pub async fn connect(url: &str) -> anyhow::Result<WsStream> {
    let (ws, _) = connect_async(url).await?;
    Ok(ws)
}
