//! Food pellet.

use glam::DVec2;
use protocol::FoodState;

/// Food identifier, drawn from the same counter as player ids.
pub type FoodId = u32;

/// A food pellet that can be eaten by players.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Food {
    pub id: FoodId,
    pub position: DVec2,
    /// Color index, only meaningful to clients.
    pub color: u8,
}

impl Food {
    /// Create a new food pellet.
    pub fn new(id: FoodId, position: DVec2, color: u8) -> Self {
        Self { id, position, color }
    }

    /// Wire representation.
    pub fn to_state(&self) -> FoodState {
        FoodState {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            color: self.color,
        }
    }
}
