//! Server -> Client message building.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// Message sent from the server to every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Full world snapshot, sent once per tick.
    State(StateMessage),
}

impl ServerMessage {
    /// Serialize the message to its JSON text form.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The full world view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMessage {
    pub players: Vec<PlayerState>,
    pub food: Vec<FoodState>,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Side length of the (square, toroidal) world.
    pub map_size: f64,
}

/// A player as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub boosting: bool,
    pub length: f64,
}

/// A food pellet as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodState {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub color: u8,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    /// Integer part of the player's length.
    pub score: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_message_shape() {
        let msg = ServerMessage::State(StateMessage {
            players: vec![PlayerState {
                id: 7,
                name: "Player".to_string(),
                x: 10.0,
                y: 20.5,
                angle: 0.0,
                boosting: true,
                length: 43.0,
            }],
            food: vec![FoodState {
                id: 3,
                x: 1.0,
                y: 2.0,
                color: 5,
            }],
            leaderboard: vec![LeaderboardEntry {
                name: "Player".to_string(),
                score: 43,
            }],
            map_size: 4000.0,
        });

        let json = msg.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], crate::packets::TYPE_STATE);
        assert_eq!(value["mapSize"], 4000.0);
        assert_eq!(value["players"][0]["id"], 7);
        assert_eq!(value["players"][0]["boosting"], true);
        assert_eq!(value["players"][0]["length"], 43.0);
        assert_eq!(value["food"][0]["color"], 5);
        assert_eq!(value["leaderboard"][0]["score"], 43);
    }

    #[test]
    fn test_empty_state_decodes() {
        let json = r#"{"type":"state","players":[],"food":[],"leaderboard":[],"mapSize":100.0}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        let ServerMessage::State(state) = msg;
        assert!(state.players.is_empty());
        assert_eq!(state.map_size, 100.0);
    }
}
