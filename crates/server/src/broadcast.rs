//! Snapshot assembly and fan-out.
//!
//! The snapshot is serialized once per tick; every session receives a clone
//! of the same reference-counted buffer.

use crate::server::session::{Delivery, Session};
use crate::world::World;
use protocol::{LeaderboardEntry, ProtocolError, ServerMessage, StateMessage};
use tokio_tungstenite::tungstenite::Utf8Bytes;

/// Encoded snapshot text, cheap to clone.
pub type Payload = Utf8Bytes;

/// Per-tick delivery counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
    pub closed: usize,
}

/// Build the full world view.
pub fn assemble(world: &World, leaderboard: Vec<LeaderboardEntry>) -> StateMessage {
    StateMessage {
        players: world.players().iter().map(|p| p.to_state()).collect(),
        food: world.food().iter().map(|f| f.to_state()).collect(),
        leaderboard,
        map_size: world.map_size(),
    }
}

/// Serialize a snapshot once.
pub fn encode(snapshot: StateMessage) -> Result<Payload, ProtocolError> {
    let text = ServerMessage::State(snapshot).encode()?;
    Ok(Payload::from(text))
}

/// Hand `payload` to every session without blocking.
///
/// Sessions whose outbox is full miss this frame; sessions whose connection
/// task has ended are skipped and left for their own disconnect.
pub fn broadcast<'a>(payload: &Payload, sessions: impl IntoIterator<Item = &'a mut Session>) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    for session in sessions {
        match session.try_deliver(payload) {
            Delivery::Sent => report.delivered += 1,
            Delivery::Dropped => report.dropped += 1,
            Delivery::Closed => report.closed += 1,
        }
    }
    report
}
