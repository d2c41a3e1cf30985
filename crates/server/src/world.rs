//! World state management.
//!
//! Holds every player and food pellet. This is a plain container: no physics,
//! no collision checks, no locking. All mutation goes through the methods
//! below so the game loop stays the only writer.

use crate::entity::{Food, FoodId, Player, PlayerId};
use glam::DVec2;
use std::collections::HashMap;

/// The game world containing all entities.
#[derive(Debug)]
pub struct World {
    /// Side length of the toroidal map.
    map_size: f64,

    /// Players in join order.
    players: Vec<Player>,
    /// Food pellets. Slot order carries no meaning.
    food: Vec<Food>,

    /// Position tracking for O(1) lookup
    player_pos: HashMap<PlayerId, usize>,
    food_pos: HashMap<FoodId, usize>,
}

impl World {
    /// Create an empty world.
    pub fn new(map_size: f64) -> Self {
        Self {
            map_size,
            players: Vec::with_capacity(256),
            food: Vec::with_capacity(1024),
            player_pos: HashMap::with_capacity(256),
            food_pos: HashMap::with_capacity(1024),
        }
    }

    #[inline]
    pub fn map_size(&self) -> f64 {
        self.map_size
    }

    /// Add a player at `position`. An existing player with the same id is replaced.
    pub fn add_player(&mut self, id: PlayerId, name: String, position: DVec2, length: f64) -> &Player {
        self.remove_player(id);
        let pos = self.players.len();
        self.players.push(Player::new(id, name, position, length));
        self.player_pos.insert(id, pos);
        &self.players[pos]
    }

    /// Remove a player, keeping the join order of everyone else.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let pos = self.player_pos.remove(&id)?;
        let player = self.players.remove(pos);
        for (i, p) in self.players.iter().enumerate().skip(pos) {
            self.player_pos.insert(p.id, i);
        }
        Some(player)
    }

    /// Update steering. Returns false if the player is gone.
    pub fn set_player_input(&mut self, id: PlayerId, angle: f64, boosting: bool) -> bool {
        match self.player_mut(id) {
            Some(player) => {
                player.angle = angle;
                player.boosting = boosting;
                true
            }
            None => false,
        }
    }

    /// Rename a player. Returns false if the player is gone.
    pub fn set_player_name(&mut self, id: PlayerId, name: String) -> bool {
        match self.player_mut(id) {
            Some(player) => {
                player.name = name;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.player_pos.get(&id).map(|&pos| &self.players[pos])
    }

    #[inline]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        let pos = *self.player_pos.get(&id)?;
        self.players.get_mut(pos)
    }

    /// All players in join order.
    #[inline]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Mutable access by slot, for the simulation pass.
    #[inline]
    pub(crate) fn player_at_mut(&mut self, index: usize) -> Option<&mut Player> {
        self.players.get_mut(index)
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Add a food pellet. An existing pellet with the same id is replaced in place.
    pub fn insert_food(&mut self, food: Food) {
        if let Some(&pos) = self.food_pos.get(&food.id) {
            self.food[pos] = food;
            return;
        }
        let pos = self.food.len();
        self.food.push(food);
        self.food_pos.insert(food.id, pos);
    }

    /// Swap a consumed pellet for its replacement in one step.
    ///
    /// The replacement takes the consumed pellet's slot, so the food count
    /// never dips. Returns the removed pellet, or `None` (and changes
    /// nothing) if `old_id` is not present.
    pub fn replace_food(&mut self, old_id: FoodId, new_food: Food) -> Option<Food> {
        let pos = self.food_pos.remove(&old_id)?;
        if let Some(stale) = self.food_pos.remove(&new_food.id) {
            // The new id was already live; drop that pellet so ids stay unique.
            self.food_pos.insert(old_id, pos);
            self.remove_food_at(stale);
            let pos = self.food_pos.remove(&old_id)?;
            return Some(self.put_food_at(pos, new_food));
        }
        Some(self.put_food_at(pos, new_food))
    }

    fn put_food_at(&mut self, pos: usize, food: Food) -> Food {
        self.food_pos.insert(food.id, pos);
        std::mem::replace(&mut self.food[pos], food)
    }

    /// O(1) swap-remove of the pellet at `pos`, whose id is already unindexed.
    fn remove_food_at(&mut self, pos: usize) {
        let last_pos = self.food.len() - 1;
        if pos != last_pos {
            let swapped_id = self.food[last_pos].id;
            self.food.swap(pos, last_pos);
            self.food_pos.insert(swapped_id, pos);
        }
        self.food.pop();
    }

    /// All food pellets.
    #[inline]
    pub fn food(&self) -> &[Food] {
        &self.food
    }

    #[inline]
    pub fn contains_food(&self, id: FoodId) -> bool {
        self.food_pos.contains_key(&id)
    }

    #[inline]
    pub fn food_count(&self) -> usize {
        self.food.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn food(id: FoodId, x: f64, y: f64) -> Food {
        Food::new(id, DVec2::new(x, y), 0)
    }

    #[test]
    fn test_add_player_defaults() {
        let mut world = World::new(4000.0);
        let player = world.add_player(1, "Player".to_string(), DVec2::new(5.0, 6.0), 40.0);
        assert_eq!(player.angle, 0.0);
        assert!(!player.boosting);
        assert_eq!(player.length, 40.0);
        assert_eq!(player.name, "Player");
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_remove_player_keeps_join_order() {
        let mut world = World::new(100.0);
        for id in 1..=4 {
            world.add_player(id, "Player".to_string(), DVec2::ZERO, 40.0);
        }
        assert!(world.remove_player(2).is_some());
        assert!(world.remove_player(2).is_none());

        let ids: Vec<PlayerId> = world.players().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(world.player(4).map(|p| p.id), Some(4));
        assert!(world.set_player_input(3, 1.0, true));
        assert!(world.player(3).unwrap().boosting);
    }

    #[test]
    fn test_unknown_player_mutations_are_noops() {
        let mut world = World::new(100.0);
        world.add_player(1, "Player".to_string(), DVec2::ZERO, 40.0);
        assert!(!world.set_player_input(99, 1.0, true));
        assert!(!world.set_player_name(99, "ghost".to_string()));
        assert!(world.remove_player(99).is_none());
        assert_eq!(world.player_count(), 1);
        assert!(!world.player(1).unwrap().boosting);
    }

    #[test]
    fn test_replace_food_keeps_count() {
        let mut world = World::new(100.0);
        world.insert_food(food(1, 1.0, 1.0));
        world.insert_food(food(2, 2.0, 2.0));
        world.insert_food(food(3, 3.0, 3.0));

        let old = world.replace_food(2, food(10, 9.0, 9.0)).unwrap();
        assert_eq!(old.id, 2);
        assert_eq!(world.food_count(), 3);
        assert!(!world.contains_food(2));
        assert!(world.contains_food(10));
        assert_eq!(world.food()[1].id, 10);
    }

    #[test]
    fn test_replace_unknown_food_changes_nothing() {
        let mut world = World::new(100.0);
        world.insert_food(food(1, 1.0, 1.0));
        assert!(world.replace_food(42, food(10, 9.0, 9.0)).is_none());
        assert_eq!(world.food_count(), 1);
        assert!(!world.contains_food(10));
    }

    #[test]
    fn test_replace_food_with_live_id_keeps_ids_unique() {
        let mut world = World::new(100.0);
        world.insert_food(food(1, 1.0, 1.0));
        world.insert_food(food(2, 2.0, 2.0));
        world.insert_food(food(3, 3.0, 3.0));

        world.replace_food(1, food(3, 7.0, 7.0));
        let mut ids: Vec<FoodId> = world.food().iter().map(|f| f.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3]);
        let three = world.food().iter().find(|f| f.id == 3).unwrap();
        assert_eq!(three.position, DVec2::new(7.0, 7.0));
    }
}
