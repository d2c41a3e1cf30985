//! Shared protocol crate for native-worms.
//!
//! This crate contains:
//! - Client -> server message parsing (`join`, `input`)
//! - The server -> client world snapshot schema (`state`)
//! - Protocol error types
//!
//! Every message is a JSON object tagged by its `type` field.

mod error;
pub mod packets;

pub use error::ProtocolError;
pub use packets::{ClientMessage, FoodState, LeaderboardEntry, PlayerState, ServerMessage, StateMessage};

/// Largest inbound message accepted by [`ClientMessage::parse`] unless the
/// caller supplies its own limit.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024;
