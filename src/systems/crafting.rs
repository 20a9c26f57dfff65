//! Crafting jobs and production zones (`spec.md` §2 "Supporting systems").
//! A craft goal resolves (via `ActionPlanner`) to `PrimitiveAction::Craft`
//! executed inside a `Zone::Work`; this system owns the in-progress job
//! state the snapshot builder reports as "crafting jobs in progress"
//! (`spec.md` §4.11).

use crate::ids::{AgentId, ZoneId};
use crate::world::inventory::ResourceKind;
use crate::world::WorldState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingRecipe {
    pub output: ResourceKind,
    pub wood_cost: u32,
    pub stone_cost: u32,
    pub ticks_required: u32,
}

pub const TOOL_RECIPE: CraftingRecipe = CraftingRecipe { output: ResourceKind::Tool, wood_cost: 2, stone_cost: 1, ticks_required: 20 };

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftingJob {
    pub agent: AgentId,
    pub zone: ZoneId,
    pub recipe: CraftingRecipe,
    pub ticks_elapsed: u32,
}

#[derive(Default)]
pub struct CraftingSystem {
    jobs: HashMap<AgentId, CraftingJob>,
}

impl CraftingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs_in_progress(&self) -> impl Iterator<Item = &CraftingJob> {
        self.jobs.values()
    }

    /// Executes one tick of `PrimitiveAction::Craft` for `agent` inside
    /// `zone`. Consumes ingredients from the zone stockpile on job start;
    /// `true` once the job completes and the output lands in the agent's
    /// inventory (overflowing to the zone stockpile if the agent is at
    /// capacity, mirroring `spec.md` §4.7 "Work yields").
    pub fn advance(&mut self, world: &mut WorldState, agent: AgentId, zone: ZoneId) -> bool {
        if !self.jobs.contains_key(&agent) {
            let recipe = TOOL_RECIPE;
            let Some(z) = world.zones.get_mut(&zone) else {
                return false;
            };
            if z.stockpile.get(ResourceKind::Wood) < recipe.wood_cost || z.stockpile.get(ResourceKind::Stone) < recipe.stone_cost {
                return false;
            }
            z.stockpile.remove(ResourceKind::Wood, recipe.wood_cost);
            z.stockpile.remove(ResourceKind::Stone, recipe.stone_cost);
            self.jobs.insert(agent, CraftingJob { agent, zone, recipe, ticks_elapsed: 0 });
        }

        let done = {
            let job = self.jobs.get_mut(&agent).unwrap();
            job.ticks_elapsed += 1;
            job.ticks_elapsed >= job.recipe.ticks_required
        };
        if !done {
            return false;
        }
        let job = self.jobs.remove(&agent).unwrap();
        let added = world.agent_inventory_mut(agent).map(|mut inv| inv.add(job.recipe.output, 1)).unwrap_or(0);
        if added == 0 {
            if let Some(z) = world.zones.get_mut(&zone) {
                z.stockpile.add(job.recipe.output, 1);
            }
        }
        true
    }

    pub fn cancel(&mut self, agent: AgentId) {
        self.jobs.remove(&agent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::terrain::TerrainGrid;
    use crate::world::zone::{Aabb, ZoneType};
    use crate::world::AgentProfile;
    use glam::Vec2;

    #[test]
    fn job_completes_after_required_ticks_and_yields_tool() {
        let mut world = WorldState::new(TerrainGrid::new_flat(16, 16, crate::world::terrain::TileType::Grass));
        let agent = world.add_agent(AgentProfile::default());
        let zone = world.add_zone(ZoneType::Work, Aabb::new(Vec2::ZERO, Vec2::splat(10.0)), 10);
        world.zones.get_mut(&zone).unwrap().stockpile.add(ResourceKind::Wood, 5);
        world.zones.get_mut(&zone).unwrap().stockpile.add(ResourceKind::Stone, 5);

        let mut system = CraftingSystem::new();
        let mut completed = false;
        for _ in 0..TOOL_RECIPE.ticks_required {
            completed = system.advance(&mut world, agent, zone);
        }
        assert!(completed);
        assert_eq!(world.agent_inventory(agent).unwrap().get(ResourceKind::Tool), 1);
    }

    #[test]
    fn job_does_not_start_without_ingredients() {
        let mut world = WorldState::new(TerrainGrid::new_flat(16, 16, crate::world::terrain::TileType::Grass));
        let agent = world.add_agent(AgentProfile::default());
        let zone = world.add_zone(ZoneType::Work, Aabb::new(Vec2::ZERO, Vec2::splat(10.0)), 10);
        let mut system = CraftingSystem::new();
        assert!(!system.advance(&mut world, agent, zone));
    }
}
