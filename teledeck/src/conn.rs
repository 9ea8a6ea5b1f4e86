//! Connection status tracking for a viewer session. The transition function
//! is pure so the reconnection policy is testable without a network; the
//! schedule owns the single pending retry slot.

use std::time::Duration;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Online,
    Offline,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Transport handshake completed.
    Opened,
    /// Connect attempt failed before the transport opened.
    ConnectFailed,
    /// Transport errored while open.
    ReadError,
    /// Peer closed the stream.
    StreamClosed,
    /// The pending reconnect delay elapsed.
    RetryElapsed,
}

/// Any loss of connection lands in a state that waits for `RetryElapsed`;
/// no other event moves the machine out of it.
pub fn advance(state: ConnectionState, event: ConnectionEvent) -> ConnectionState {
    use ConnectionEvent::*;
    use ConnectionState::*;
    match (state, event) {
        (Connecting, Opened) => Online,
        (Connecting, ConnectFailed | ReadError | StreamClosed) => Offline,
        (Online, ReadError) => Offline,
        (Online, StreamClosed) => Reconnecting,
        (Offline | Reconnecting, RetryElapsed) => Connecting,
        (state, _) => state,
    }
}

/// Fixed-delay retry slot: at most one pending retry at a time, armed on
/// connection loss, cleared when it fires, dropped wholesale on teardown.
#[derive(Debug)]
pub struct ReconnectSchedule {
    delay: Duration,
    armed: bool,
}

impl ReconnectSchedule {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            armed: false,
        }
    }

    /// Returns the delay to wait if this call armed the retry; `None` when
    /// a retry is already pending.
    pub fn arm(&mut self) -> Option<Duration> {
        if self.armed {
            return None;
        }
        self.armed = true;
        Some(self.delay)
    }

    pub fn fired(&mut self) {
        self.armed = false;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
