//! Animal wandering and predator proximity (`spec.md` §2 "Supporting
//! systems"). Interface-level per the spec: animals wander the terrain and
//! contribute to `GoalContext.nearby_predators`; full species behavior
//! (herding, fear decay, reproduction) is the teacher's domain
//! (`entities/fear.rs`, `entities/reproduction.rs`) and out of scope for
//! the core's AI planner, which only needs a predator/prey signal.

use crate::world::animal::AnimalKind;
use crate::world::WorldState;
use glam::Vec2;
use rand::Rng;

const WANDER_STEP: f32 = 1.5;
const PREDATOR_DETECTION_RADIUS: f32 = 30.0;

/// Advances every living animal by one wander step. Animals never leave
/// the terrain bounds; a blocked step is simply skipped this tick. Takes
/// an injected RNG so runs with identical seeds stay reproducible
/// (`spec.md` §8 scenario S6).
pub fn tick(world: &mut WorldState, rng: &mut impl Rng) {
    let ids = world.living_animal_ids();
    for id in ids {
        let Some(position) = world.get_animal(id).map(|a| a.position) else {
            continue;
        };
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let delta = Vec2::new(angle.cos(), angle.sin()) * WANDER_STEP;
        let candidate = position + delta;
        let tile_x = candidate.x as i32;
        let tile_y = candidate.y as i32;
        if !world.terrain.get(tile_x, tile_y).map(|t| t.is_walkable).unwrap_or(false) {
            continue;
        }
        if let Some(mut animal) = world.get_animal_mut(id) {
            animal.position = candidate;
        }
        world.spatial_index.insert_animal(id, candidate);
    }
}

/// Counts predator-kind animals within `PREDATOR_DETECTION_RADIUS` of
/// `position`; feeds `GoalContext.nearby_predators` in the AI pipeline.
pub fn nearby_predator_count(world: &WorldState, position: Vec2) -> u32 {
    world
        .spatial_index
        .query_radius(position, PREDATOR_DETECTION_RADIUS, |id| {
            id.as_animal()
                .and_then(|aid| world.get_animal(aid))
                .map(|a| !a.is_dead && a.kind.is_predator())
                .unwrap_or(false)
        })
        .len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::terrain::{TerrainGrid, TileType};

    #[test]
    fn predator_detected_within_radius() {
        let mut world = WorldState::new(TerrainGrid::new_flat(64, 64, TileType::Grass));
        world.add_animal(AnimalKind::Wolf, Vec2::new(10.0, 10.0));
        let count = nearby_predator_count(&world, Vec2::new(12.0, 10.0));
        assert_eq!(count, 1);
    }

    #[test]
    fn distant_predator_not_detected() {
        let mut world = WorldState::new(TerrainGrid::new_flat(64, 64, TileType::Grass));
        world.add_animal(AnimalKind::Wolf, Vec2::new(500.0, 500.0));
        let count = nearby_predator_count(&world, Vec2::new(0.0, 0.0));
        assert_eq!(count, 0);
    }
}
