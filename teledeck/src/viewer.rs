//! Viewer session runner: keeps one connection to the hub alive, surfaces
//! status changes on a watch channel, and delivers parsed frames to the
//! consumer. Connection loss is self-healing; only teardown stops it.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::conn::{advance, ConnectionEvent, ConnectionState, ReconnectSchedule};
use crate::types::ServerFrame;
use crate::ws;

/// Parsed frames buffered for the consumer before the reader awaits.
const FRAME_BUFFER: usize = 64;

pub struct ViewerHandle {
    /// Latest connection status; updated on every transition.
    pub status: watch::Receiver<ConnectionState>,
    /// Parsed frames, in arrival order.
    pub frames: mpsc::Receiver<ServerFrame>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ViewerHandle {
    /// Tear the session down: cancels any pending reconnect, closes the
    /// transport, and lets the runner exit from whatever state it is in.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub async fn join(self) {
        let _ = self.task.await;
    }
}

pub fn spawn(url: String, retry_delay: Duration) -> ViewerHandle {
    let (status_tx, status_rx) = watch::channel(ConnectionState::Connecting);
    let (frame_tx, frame_rx) = mpsc::channel(FRAME_BUFFER);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run(url, retry_delay, status_tx, frame_tx, shutdown_rx));
    ViewerHandle {
        status: status_rx,
        frames: frame_rx,
        shutdown: shutdown_tx,
        task,
    }
}

async fn run(
    url: String,
    retry_delay: Duration,
    status: watch::Sender<ConnectionState>,
    frames: mpsc::Sender<ServerFrame>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut schedule = ReconnectSchedule::new(retry_delay);
    let mut state = ConnectionState::Connecting;

    loop {
        // state == Connecting at the top of every pass
        let attempt = tokio::select! {
            _ = shutdown.changed() => break,
            attempt = ws::connect(&url) => attempt,
        };

        match attempt {
            Ok(mut stream) => {
                state = advance(state, ConnectionEvent::Opened);
                let _ = status.send(state);
                info!(event = "stream_online", url = %url);

                let event = tokio::select! {
                    _ = shutdown.changed() => {
                        let _ = stream.close(None).await;
                        break;
                    }
                    event = pump(&mut stream, &frames) => event,
                };
                state = advance(state, event);
                let _ = status.send(state);
            }
            Err(err) => {
                warn!(event = "connect_failed", url = %url, error = %err);
                state = advance(state, ConnectionEvent::ConnectFailed);
                let _ = status.send(state);
            }
        }

        // Exactly one pending retry per loss, then back to Connecting.
        let Some(delay) = schedule.arm() else { continue };
        tokio::select! {
            _ = shutdown.changed() => {
                schedule.cancel();
                break;
            }
            _ = sleep(delay) => {}
        }
        schedule.fired();
        state = advance(state, ConnectionEvent::RetryElapsed);
        let _ = status.send(state);
    }
}

/// Drive the read side while online. Returns the event that ended the
/// stream. Unparseable frames are logged and dropped without a transition.
async fn pump(stream: &mut ws::WsStream, frames: &mpsc::Sender<ServerFrame>) -> ConnectionEvent {
    while let Some(next) = stream.next().await {
        match next {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerFrame>(&text) {
                Ok(frame) => {
                    if frames.send(frame).await.is_err() {
                        // Consumer went away; stop reading.
                        return ConnectionEvent::StreamClosed;
                    }
                }
                Err(err) => {
                    warn!(event = "frame_discarded", error = %err);
                }
            },
            Ok(Message::Close(_)) => return ConnectionEvent::StreamClosed,
            Ok(_) => {}
            Err(err) => {
                warn!(event = "stream_error", error = %err);
                return ConnectionEvent::ReadError;
            }
        }
    }
    ConnectionEvent::StreamClosed
}
