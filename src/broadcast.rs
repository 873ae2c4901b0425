//! Outbound fan-out: per-session write handles and zone-scoped broadcast.
//!
//! Each live session owns an unbounded outbound queue drained by its writer
//! task, so emitting never suspends the caller and per-sender order is
//! preserved. A broadcast serializes the frame once and reuses the buffer
//! across recipients. Writes to closed sessions are best-effort; the next
//! heartbeat cycle removes the session.

use crate::limits::RateGate;
use crate::protocol::ServerMessage;
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;

// ---------------------------------------------------------------------------
// Session handle
// ---------------------------------------------------------------------------

/// Shared write-side state of one live session.
pub struct SessionHandle {
    sender: UnboundedSender<Message>,
    /// Set when a heartbeat ping goes out; cleared by the pong.
    awaiting_pong: AtomicBool,
    pub gate: RateGate,
}

impl SessionHandle {
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self {
            sender,
            awaiting_pong: AtomicBool::new(false),
            gate: RateGate::new(),
        }
    }

    /// Queue a frame. False means the session's writer is gone.
    pub fn send_raw(&self, msg: Message) -> bool {
        self.sender.send(msg).is_ok()
    }

    /// Arm the heartbeat. Returns false when the previous ping was never
    /// acknowledged, i.e. the session is stale.
    pub fn arm_ping(&self) -> bool {
        !self.awaiting_pong.swap(true, Ordering::AcqRel)
    }

    pub fn note_pong(&self) {
        self.awaiting_pong.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Broadcaster
// ---------------------------------------------------------------------------

pub struct Broadcaster {
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, session_id: &str, sender: UnboundedSender<Message>) -> Arc<SessionHandle> {
        let handle = Arc::new(SessionHandle::new(sender));
        self.sessions
            .write()
            .insert(session_id.to_string(), handle.clone());
        handle
    }

    pub fn unregister(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.write().remove(session_id)
    }

    pub fn handle(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Send one frame to one session.
    pub fn send_to(&self, session_id: &str, msg: &ServerMessage) {
        let Some(handle) = self.handle(session_id) else {
            return;
        };
        match serde_json::to_string(msg) {
            Ok(text) => {
                if !handle.send_raw(Message::Text(text)) {
                    debug!("dropped frame for closed session {}", session_id);
                }
            }
            Err(e) => warn!("failed to serialize frame: {}", e),
        }
    }

    /// Fan a frame out to a member snapshot, serializing once. `exclude`
    /// skips one session (typically the originator).
    pub fn to_many(&self, members: &[String], msg: &ServerMessage, exclude: Option<&str>) {
        let text = match serde_json::to_string(msg) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to serialize broadcast: {}", e);
                return;
            }
        };
        let sessions = self.sessions.read();
        for id in members {
            if exclude == Some(id.as_str()) {
                continue;
            }
            if let Some(handle) = sessions.get(id) {
                if !handle.send_raw(Message::Text(text.clone())) {
                    debug!("dropped broadcast for closed session {}", id);
                }
            }
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
