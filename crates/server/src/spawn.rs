//! Spawn policy: fresh ids, random positions and food colors.

use crate::entity::Food;
use glam::DVec2;
use rand::Rng;

/// Generates ids and randomized placement for new entities.
///
/// Holds no RNG of its own; callers pass the one owned by the game state.
#[derive(Debug, Clone)]
pub struct SpawnPolicy {
    map_size: f64,
    food_colors: u8,
    /// Next entity ID to assign.
    next_entity_id: u32,
}

impl SpawnPolicy {
    pub fn new(map_size: f64, food_colors: u8) -> Self {
        Self {
            map_size,
            food_colors: food_colors.max(1),
            next_entity_id: 1,
        }
    }

    /// Get the next entity ID. Shared by players and food; 0 is never issued.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        if self.next_entity_id == 0 {
            self.next_entity_id = 1; // Skip 0
        }
        id
    }

    /// Uniform over `[0, map_size)` on both axes.
    #[inline]
    pub fn random_position(&self, rng: &mut impl Rng) -> DVec2 {
        DVec2::new(
            rng.random_range(0.0..self.map_size),
            rng.random_range(0.0..self.map_size),
        )
    }

    /// Where a newly connected player appears. Overlapping food or other
    /// players is allowed.
    #[inline]
    pub fn spawn_position(&self, rng: &mut impl Rng) -> DVec2 {
        self.random_position(rng)
    }

    /// A food pellet with a fresh id, random position and random color.
    pub fn new_food(&mut self, rng: &mut impl Rng) -> Food {
        let id = self.next_id();
        let position = self.random_position(rng);
        let color = rng.random_range(0..self.food_colors);
        Food::new(id, position, color)
    }
}
