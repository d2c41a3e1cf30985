//! One discrete simulation tick.
//!
//! This module handles:
//! - Movement with toroidal wrapping
//! - Eating (player head within `eat_radius` of a pellet)
//! - Respawning every eaten pellet in the same step

use crate::config::Config;
use crate::entity::{FoodId, PlayerId};
use crate::spawn::SpawnPolicy;
use crate::world::World;
use glam::DVec2;
use rand::Rng;
use thiserror::Error;
use tracing::warn;

/// Tunables read once from the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub map_size: f64,
    pub base_speed: f64,
    pub boost_extra: f64,
    pub eat_radius: f64,
    pub growth: f64,
}

impl From<&Config> for StepParams {
    fn from(config: &Config) -> Self {
        Self {
            map_size: config.world.map_size,
            base_speed: config.player.base_speed,
            boost_extra: config.player.boost_extra,
            eat_radius: config.player.eat_radius,
            growth: config.player.growth,
        }
    }
}

/// A problem with one player's update. The player is skipped for the tick.
#[derive(Debug, Error)]
pub enum StepFault {
    #[error("Player {id} would move to a non-finite position ({x}, {y})")]
    NonFinitePosition { id: PlayerId, x: f64, y: f64 },

    #[error("Player slot {0} vanished mid-tick")]
    MissingSlot(usize),
}

/// What happened during a step.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Pellets eaten this tick: (food_id, eater_id).
    pub eaten: Vec<(FoodId, PlayerId)>,
    /// Players skipped because of a fault.
    pub faults: usize,
}

/// Wrap a coordinate into `[0, map_size)`.
///
/// Works for any finite displacement, not just one map width, and is
/// idempotent. Non-finite input stays non-finite.
#[inline]
pub fn wrap(v: f64, map_size: f64) -> f64 {
    if (0.0..map_size).contains(&v) {
        return v;
    }
    let r = v.rem_euclid(map_size);
    // rem_euclid can round up to exactly map_size for tiny negative inputs.
    if r >= map_size { 0.0 } else { r }
}

/// Whether a pellet at `food` is inside the eat radius of a head at `head`.
#[inline]
pub fn within_eat_radius(head: DVec2, food: DVec2, eat_radius: f64) -> bool {
    head.distance(food) < eat_radius
}

/// Advance the world by one tick.
///
/// Players are processed in join order. Each one moves, then eats every
/// pellet in range; an eaten pellet is replaced immediately, so a player
/// later in the order already sees the replacement and never the eaten one.
pub fn step(
    world: &mut World,
    spawner: &mut SpawnPolicy,
    rng: &mut impl Rng,
    params: &StepParams,
) -> StepReport {
    let mut report = StepReport::default();

    for index in 0..world.player_count() {
        match advance_player(world, index, params) {
            Ok((player_id, head)) => {
                consume_food(world, index, player_id, head, spawner, rng, params, &mut report);
            }
            Err(fault) => {
                warn!("Skipping player this tick: {}", fault);
                report.faults += 1;
            }
        }
    }

    report
}

/// Move the player in `index`. On error the player is left untouched.
fn advance_player(
    world: &mut World,
    index: usize,
    params: &StepParams,
) -> Result<(PlayerId, DVec2), StepFault> {
    let player = world
        .player_at_mut(index)
        .ok_or(StepFault::MissingSlot(index))?;

    let speed = player.speed(params.base_speed, params.boost_extra);
    let moved = player.position + player.heading() * speed;
    let next = DVec2::new(wrap(moved.x, params.map_size), wrap(moved.y, params.map_size));

    if !next.is_finite() {
        return Err(StepFault::NonFinitePosition {
            id: player.id,
            x: next.x,
            y: next.y,
        });
    }

    player.position = next;
    Ok((player.id, next))
}

#[allow(clippy::too_many_arguments)]
fn consume_food(
    world: &mut World,
    index: usize,
    player_id: PlayerId,
    head: DVec2,
    spawner: &mut SpawnPolicy,
    rng: &mut impl Rng,
    params: &StepParams,
    report: &mut StepReport,
) {
    // Replacements land in the eaten pellet's slot and are not re-tested
    // against this player until the next tick.
    for slot in 0..world.food_count() {
        let Some(&food) = world.food().get(slot) else {
            break;
        };
        if !within_eat_radius(head, food.position, params.eat_radius) {
            continue;
        }

        let replacement = spawner.new_food(rng);
        if world.replace_food(food.id, replacement).is_none() {
            continue;
        }
        if let Some(player) = world.player_at_mut(index) {
            player.grow(params.growth);
        }
        report.eaten.push((food.id, player_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Food;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MAP: f64 = 4000.0;

    fn params() -> StepParams {
        StepParams {
            map_size: MAP,
            base_speed: 3.0,
            boost_extra: 2.0,
            eat_radius: 20.0,
            growth: 3.0,
        }
    }

    fn world_with_food(spawner: &mut SpawnPolicy, rng: &mut StdRng, count: usize) -> World {
        let mut world = World::new(MAP);
        for _ in 0..count {
            world.insert_food(spawner.new_food(rng));
        }
        world
    }

    #[test]
    fn test_wrap_range_and_idempotence() {
        let samples = [
            -1e9, -8001.5, -4000.0, -3999.9, -1.0, -1e-17, 0.0, 1.0, 3999.999, 4000.0, 4003.0,
            12345.678, 1e12,
        ];
        for v in samples {
            let w = wrap(v, MAP);
            assert!((0.0..MAP).contains(&w), "wrap({}) = {}", v, w);
            assert_eq!(wrap(w, MAP), w, "wrap not idempotent for {}", v);
        }
        assert_eq!(wrap(-3.0, MAP), 3997.0);
        assert_eq!(wrap(4003.0, MAP), 3.0);
        assert_eq!(wrap(2.5, MAP), 2.5);
    }

    #[test]
    fn test_wrap_leaves_non_finite_values_non_finite() {
        assert!(wrap(f64::NAN, MAP).is_nan());
        assert!(!wrap(f64::INFINITY, MAP).is_finite());
    }

    #[test]
    fn test_movement_and_boost() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut spawner = SpawnPolicy::new(MAP, 6);
        let mut world = World::new(MAP);
        world.add_player(1, "a".into(), DVec2::new(100.0, 100.0), 40.0);
        world.add_player(2, "b".into(), DVec2::new(200.0, 200.0), 40.0);
        world.set_player_input(2, std::f64::consts::FRAC_PI_2, true);

        step(&mut world, &mut spawner, &mut rng, &params());

        let a = world.player(1).unwrap().position;
        let b = world.player(2).unwrap().position;
        assert!((a - DVec2::new(103.0, 100.0)).length() < 1e-9);
        assert!((b - DVec2::new(200.0, 205.0)).length() < 1e-9);
    }

    #[test]
    fn test_movement_wraps_across_edges() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut spawner = SpawnPolicy::new(MAP, 6);
        let mut world = World::new(MAP);
        world.add_player(1, "a".into(), DVec2::new(1.0, 3999.0), 40.0);
        world.set_player_input(1, std::f64::consts::PI * 0.75, true);

        step(&mut world, &mut spawner, &mut rng, &params());

        let p = world.player(1).unwrap().position;
        assert!(p.x > 3990.0 && p.x < MAP, "x = {}", p.x);
        assert!(p.y >= 0.0 && p.y < 5.0, "y = {}", p.y);
    }

    #[test]
    fn test_single_food_scenario() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut spawner = SpawnPolicy::new(MAP, 6);
        let mut world = World::new(MAP);
        let player_id = spawner.next_id();
        let food_id = spawner.next_id();
        world.add_player(player_id, "Player".into(), DVec2::new(0.0, 0.0), 40.0);
        world.insert_food(Food::new(food_id, DVec2::new(2.0, 0.0), 1));

        let report = step(&mut world, &mut spawner, &mut rng, &params());

        let player = world.player(player_id).unwrap();
        assert!((player.position - DVec2::new(3.0, 0.0)).length() < 1e-9);
        assert_eq!(player.length, 43.0);
        assert_eq!(world.food_count(), 1);
        assert!(!world.contains_food(food_id));
        assert_ne!(world.food()[0].id, food_id);
        assert_eq!(report.eaten, vec![(food_id, player_id)]);
    }

    #[test]
    fn test_far_player_does_not_grow() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut spawner = SpawnPolicy::new(MAP, 6);
        let mut world = World::new(MAP);
        world.add_player(1, "Player".into(), DVec2::new(0.0, 0.0), 40.0);
        // Player ends the tick at (3, 0); this pellet is exactly eat_radius away.
        world.insert_food(Food::new(2, DVec2::new(23.0, 0.0), 0));

        let report = step(&mut world, &mut spawner, &mut rng, &params());

        assert_eq!(world.player(1).unwrap().length, 40.0);
        assert!(world.contains_food(2));
        assert!(report.eaten.is_empty());
    }

    #[test]
    fn test_food_under_head_is_eaten() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut spawner = SpawnPolicy::new(MAP, 6);
        let mut world = World::new(MAP);
        world.add_player(1, "Player".into(), DVec2::new(500.0, 500.0), 40.0);
        world.insert_food(Food::new(2, DVec2::new(503.0, 500.0), 0));

        step(&mut world, &mut spawner, &mut rng, &params());

        assert_eq!(world.player(1).unwrap().length, 43.0);
        assert!(!world.contains_food(2));
    }

    #[test]
    fn test_one_player_eats_several_pellets() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut spawner = SpawnPolicy::new(MAP, 6);
        let mut world = World::new(MAP);
        world.add_player(1, "Player".into(), DVec2::new(1000.0, 1000.0), 40.0);
        world.insert_food(Food::new(2, DVec2::new(1003.0, 1000.0), 0));
        world.insert_food(Food::new(3, DVec2::new(1010.0, 1005.0), 0));
        world.insert_food(Food::new(4, DVec2::new(995.0, 990.0), 0));

        let report = step(&mut world, &mut spawner, &mut rng, &params());

        assert_eq!(report.eaten.len(), 3);
        assert_eq!(world.player(1).unwrap().length, 49.0);
        assert_eq!(world.food_count(), 3);
    }

    #[test]
    fn test_contested_pellet_goes_to_earlier_player() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut spawner = SpawnPolicy::new(MAP, 6);
        let mut world = World::new(MAP);
        world.add_player(1, "first".into(), DVec2::new(2000.0, 2000.0), 40.0);
        world.add_player(2, "second".into(), DVec2::new(2000.0, 2010.0), 40.0);
        world.insert_food(Food::new(3, DVec2::new(2003.0, 2005.0), 0));

        let report = step(&mut world, &mut spawner, &mut rng, &params());

        assert_eq!(report.eaten.iter().filter(|(food, _)| *food == 3).count(), 1);
        assert_eq!(world.player(1).unwrap().length, 43.0);
        assert_eq!(world.player(2).unwrap().length, 40.0);
    }

    #[test]
    fn test_food_count_is_invariant_over_many_ticks() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut spawner = SpawnPolicy::new(400.0, 6);
        let mut world = world_with_food(&mut spawner, &mut rng, 300);
        let params = StepParams {
            map_size: 400.0,
            ..params()
        };
        for i in 0..8u32 {
            let id = spawner.next_id();
            let position = spawner.spawn_position(&mut rng);
            world.add_player(id, "Player".into(), position, 40.0);
            world.set_player_input(id, f64::from(i) * 0.8, i % 2 == 0);
        }

        let mut lengths: Vec<f64> = world.players().iter().map(|p| p.length).collect();
        let mut eaten = 0;
        for _ in 0..500 {
            let report = step(&mut world, &mut spawner, &mut rng, &params);
            eaten += report.eaten.len();
            assert_eq!(world.food_count(), 300);

            for (player, before) in world.players().iter().zip(lengths.iter_mut()) {
                assert!(player.length >= *before);
                assert!((0.0..400.0).contains(&player.position.x));
                assert!((0.0..400.0).contains(&player.position.y));
                *before = player.length;
            }
        }
        assert!(eaten > 0);
    }

    #[test]
    fn test_faulty_player_does_not_stop_the_tick() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut spawner = SpawnPolicy::new(MAP, 6);
        let mut world = World::new(MAP);
        world.add_player(1, "broken".into(), DVec2::new(10.0, 10.0), 40.0);
        world.add_player(2, "fine".into(), DVec2::new(100.0, 100.0), 40.0);
        world.set_player_input(1, f64::NAN, false);
        world.insert_food(Food::new(3, DVec2::new(103.0, 100.0), 0));

        let report = step(&mut world, &mut spawner, &mut rng, &params());

        assert_eq!(report.faults, 1);
        assert_eq!(world.player(1).unwrap().position, DVec2::new(10.0, 10.0));
        assert_eq!(world.player(2).unwrap().length, 43.0);
        assert_eq!(world.food_count(), 1);
    }
}
