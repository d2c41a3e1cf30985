//! Client sessions.
//!
//! A session is one live connection. It points at the player it steers by
//! id only; the player itself lives in the world.

use crate::broadcast::Payload;
use crate::entity::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Session identifier, independent of player ids.
pub type SessionId = u32;

/// Outcome of handing a payload to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the connection task.
    Sent,
    /// Outbox full; the frame was dropped for this session.
    Dropped,
    /// Connection task is gone; it will disconnect on its own.
    Closed,
}

/// A connected client session.
#[derive(Debug)]
pub struct Session {
    /// Unique session ID.
    pub id: SessionId,
    /// Remote address.
    pub addr: SocketAddr,
    /// The player this session steers.
    pub player_id: PlayerId,
    /// Frames dropped because the outbox was full.
    pub dropped_frames: u64,
    /// Last inbound message.
    pub last_activity: Instant,
    /// Bounded queue drained by the connection task.
    outbox: mpsc::Sender<Payload>,
}

impl Session {
    /// Create a new session.
    pub fn new(id: SessionId, addr: SocketAddr, player_id: PlayerId, outbox: mpsc::Sender<Payload>) -> Self {
        Self {
            id,
            addr,
            player_id,
            dropped_frames: 0,
            last_activity: Instant::now(),
            outbox,
        }
    }

    /// Record inbound activity.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Queue a payload without waiting.
    pub fn try_deliver(&mut self, payload: &Payload) -> Delivery {
        match self.outbox.try_send(payload.clone()) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => {
                self.dropped_frames += 1;
                debug!(
                    "Session {} ({}) is behind, dropped frame ({} total)",
                    self.id, self.addr, self.dropped_frames
                );
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// All live sessions, keyed by session id.
#[derive(Debug)]
pub struct SessionRegistry {
    next_session_id: SessionId,
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            next_session_id: 1,
            sessions: HashMap::new(),
        }
    }

    /// Register a session for `player_id` and return its id.
    pub fn open(&mut self, addr: SocketAddr, player_id: PlayerId, outbox: mpsc::Sender<Payload>) -> SessionId {
        let id = self.next_session_id;
        self.next_session_id = self.next_session_id.wrapping_add(1).max(1);
        self.sessions.insert(id, Session::new(id, addr, player_id, outbox));
        id
    }

    /// Forget a session. The caller removes its player.
    pub fn close(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    #[inline]
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// The player steered by a session.
    #[inline]
    pub fn player_of(&self, id: SessionId) -> Option<PlayerId> {
        self.sessions.get(&id).map(|s| s.player_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
