//! Outbound fan-out: one unbounded queue per open socket.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::{lobby::session::SessionId, metrics::CONNECTED_SESSIONS, protocol::ServerMsg};

#[derive(Clone, Default)]
pub struct Hub {
    outboxes: Arc<DashMap<SessionId, mpsc::UnboundedSender<String>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the outbox for a socket; the socket loop drains the receiver.
    pub fn register(&self, session: SessionId) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.outboxes.insert(session, tx).is_none() {
            CONNECTED_SESSIONS.inc();
        }
        rx
    }

    pub fn unregister(&self, session: SessionId) {
        if self.outboxes.remove(&session).is_some() {
            CONNECTED_SESSIONS.dec();
        }
    }

    /// Returns `false` when the session is gone or its socket loop ended.
    pub fn send(&self, session: SessionId, msg: &ServerMsg) -> bool {
        match encode(msg) {
            Some(json) => self.push(session, json),
            None => false,
        }
    }

    /// Serializes once and queues the frame for every listed session.
    pub fn broadcast<'a>(&self, sessions: impl IntoIterator<Item = &'a SessionId>, msg: &ServerMsg) {
        let Some(json) = encode(msg) else { return };
        for session in sessions {
            self.push(*session, json.clone());
        }
    }

    fn push(&self, session: SessionId, json: String) -> bool {
        self.outboxes
            .get(&session)
            .is_some_and(|tx| tx.send(json).is_ok())
    }
}

fn encode(msg: &ServerMsg) -> Option<String> {
    serde_json::to_string(msg)
        .map_err(|e| log::error!("failed to encode {msg:?}: {e}"))
        .ok()
}
