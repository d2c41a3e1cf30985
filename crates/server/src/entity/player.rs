//! Player-controlled worm head.

use glam::DVec2;
use protocol::PlayerState;

/// Player identifier.
pub type PlayerId = u32;

/// A player in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Head position, always inside `[0, map_size)` on both axes.
    pub position: DVec2,
    /// Heading in radians.
    pub angle: f64,
    pub boosting: bool,
    /// Growth score. Never decreases.
    pub length: f64,
}

impl Player {
    /// Create a player heading along +x, not boosting.
    pub fn new(id: PlayerId, name: String, position: DVec2, length: f64) -> Self {
        Self {
            id,
            name,
            position,
            angle: 0.0,
            boosting: false,
            length,
        }
    }

    /// Distance covered in one tick.
    #[inline]
    pub fn speed(&self, base_speed: f64, boost_extra: f64) -> f64 {
        if self.boosting {
            base_speed + boost_extra
        } else {
            base_speed
        }
    }

    /// Unit vector of the current heading.
    #[inline]
    pub fn heading(&self) -> DVec2 {
        DVec2::from_angle(self.angle)
    }

    /// Add to the length. Negative amounts are ignored.
    #[inline]
    pub fn grow(&mut self, amount: f64) {
        if amount > 0.0 {
            self.length += amount;
        }
    }

    /// Leaderboard score: the integer part of the length.
    #[inline]
    pub fn score(&self) -> u64 {
        self.length.max(0.0).floor() as u64
    }

    /// Wire representation.
    pub fn to_state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            name: self.name.clone(),
            x: self.position.x,
            y: self.position.y,
            angle: self.angle,
            boosting: self.boosting,
            length: self.length,
        }
    }
}
