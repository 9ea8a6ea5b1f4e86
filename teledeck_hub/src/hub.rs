//! Broadcast hub: owns the registry of connected viewer sessions and fans
//! every produced frame out to all of them, best effort.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::snapshot::Frame;

/// Outbound frames queued per session before the hub starts dropping them.
pub const SESSION_BUFFER: usize = 64;

/// One open viewer connection. Created on connect, removed from the registry
/// when the transport closes; nothing outlives the connection.
pub struct ViewerSession {
    id: u64,
    sender: mpsc::Sender<Message>,
    open: AtomicBool,
}

impl ViewerSession {
    pub fn new(id: u64, sender: mpsc::Sender<Message>) -> Self {
        Self {
            id,
            sender,
            open: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the transport is still open for writing.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }
}

#[derive(Default)]
pub struct Hub {
    sessions: RwLock<HashMap<u64, Arc<ViewerSession>>>,
    conn_counter: AtomicU64,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_session_id(&self) -> u64 {
        self.conn_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn register(&self, session: Arc<ViewerSession>) {
        let id = session.id();
        self.sessions.write().await.insert(id, session);
        debug!(event = "session_registered", session_id = id);
    }

    /// Idempotent: removing an already-absent session is a no-op.
    pub async fn unregister(&self, id: u64) {
        if let Some(session) = self.sessions.write().await.remove(&id) {
            session.mark_closed();
            debug!(event = "session_unregistered", session_id = id);
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Serialize once, then attempt delivery to every session open at this
    /// moment. Sends are non-blocking; a failed or closed session never
    /// delays or aborts delivery to the others, and is never retried.
    pub async fn broadcast(&self, frame: &Frame) {
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(err) => {
                warn!(event = "frame_encode_failed", error = %err);
                return;
            }
        };
        let sessions: Vec<Arc<ViewerSession>> =
            self.sessions.read().await.values().cloned().collect();
        for session in sessions {
            if !session.is_open() {
                debug!(event = "session_skipped", session_id = session.id());
                continue;
            }
            if let Err(err) = session.sender.try_send(Message::Text(text.clone())) {
                warn!(event = "session_send_failed", session_id = session.id(), error = %err);
            }
        }
    }
}
