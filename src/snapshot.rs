//! Serialises a consistent view of `WorldState` into an immutable payload
//! (`spec.md` §4.11 "Snapshot Builder"). The core hands snapshots to the
//! transport layer by `Arc` reference and never inspects how they are
//! delivered further.

use crate::events::SimEvent;
use crate::ids::{AgentId, AnimalId, ResourceId, ZoneId};
use crate::systems::crafting::CraftingSystem;
use crate::systems::economy::EconomySystem;
use crate::world::agent::{GoalType, LifeStage, Role};
use crate::world::inventory::ResourceKind;
use crate::world::resource::{ResourceState, ResourceType};
use crate::world::zone::ZoneType;
use crate::world::WorldState;
use glam::Vec2;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Vec2,
    pub role: Role,
    pub life_stage: LifeStage,
    pub is_dead: bool,
    pub health: f32,
    pub money: i64,
    pub needs: [f32; 7],
    pub current_goal: Option<GoalType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimalSnapshot {
    pub id: AnimalId,
    pub kind: crate::world::animal::AnimalKind,
    pub position: Vec2,
    pub is_dead: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot {
    pub id: ResourceId,
    pub kind: ResourceType,
    pub position: Vec2,
    pub state: ResourceState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneSnapshot {
    pub id: ZoneId,
    pub zone_type: ZoneType,
}

#[derive(Debug, Clone, Serialize)]
pub struct CraftingJobSnapshot {
    pub agent: AgentId,
    pub zone: ZoneId,
    pub ticks_elapsed: u32,
    pub ticks_required: u32,
}

/// Immutable per-tick payload (`spec.md` §4.11).
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub agents: Vec<AgentSnapshot>,
    pub animals: Vec<AnimalSnapshot>,
    pub resources: Vec<ResourceSnapshot>,
    pub zones: Vec<ZoneSnapshot>,
    pub market_prices: std::collections::HashMap<ResourceKind, u32>,
    pub crafting_jobs: Vec<CraftingJobSnapshot>,
    pub events: Vec<SimEvent>,
}

/// Builds snapshots and reuses the previous buffer when the tick number
/// is unchanged (`spec.md` §4.11 "reuses the previously serialised
/// buffer when ticks are identical").
#[derive(Default)]
pub struct SnapshotBuilder {
    last: Option<Arc<Snapshot>>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(
        &mut self,
        world: &WorldState,
        tick: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
        events: Vec<SimEvent>,
        crafting: &CraftingSystem,
        _economy: &EconomySystem,
    ) -> Arc<Snapshot> {
        if let Some(existing) = &self.last {
            if existing.tick == tick {
                return Arc::clone(existing);
            }
        }

        let agents = world
            .all_agent_ids()
            .into_iter()
            .filter_map(|id| {
                let agent = world.get_agent(id)?;
                let entity = world.agent_entity(id)?;
                let needs = world.ecs.get::<crate::world::agent::AgentNeeds>(entity);
                let ai_state = world.ecs.get::<crate::world::agent::AgentAIState>(entity);
                Some(AgentSnapshot {
                    id,
                    position: agent.position,
                    role: agent.role,
                    life_stage: agent.life_stage,
                    is_dead: agent.is_dead,
                    health: agent.health,
                    money: agent.money,
                    needs: needs
                        .map(|n| [n.hunger, n.thirst, n.energy, n.hygiene, n.social, n.fun, n.mental_health])
                        .unwrap_or([0.0; 7]),
                    current_goal: ai_state.and_then(|s| s.current_goal.as_ref().map(|g| g.goal_type)),
                })
            })
            .collect();

        let animals = world
            .living_animal_ids()
            .into_iter()
            .filter_map(|id| {
                let animal = world.get_animal(id)?;
                Some(AnimalSnapshot { id, kind: animal.kind, position: animal.position, is_dead: animal.is_dead })
            })
            .collect();

        let resources = world
            .resources
            .keys()
            .filter_map(|&id| {
                let r = world.get_resource(id)?;
                Some(ResourceSnapshot { id, kind: r.kind, position: r.position, state: r.state })
            })
            .collect();

        let zones = world.zones.values().map(|z| ZoneSnapshot { id: z.id, zone_type: z.zone_type }).collect();

        let market_prices = ResourceKind::ALL.iter().map(|&k| (k, world.market.price_of(k))).collect();

        let crafting_jobs = crafting
            .jobs_in_progress()
            .map(|j| CraftingJobSnapshot {
                agent: j.agent,
                zone: j.zone,
                ticks_elapsed: j.ticks_elapsed,
                ticks_required: j.recipe.ticks_required,
            })
            .collect();

        let snapshot = Arc::new(Snapshot { tick, timestamp, agents, animals, resources, zones, market_prices, crafting_jobs, events });
        self.last = Some(Arc::clone(&snapshot));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::terrain::TerrainGrid;
    use crate::world::AgentProfile;

    #[test]
    fn identical_tick_reuses_buffer() {
        let mut world = WorldState::new(TerrainGrid::new_flat(16, 16, crate::world::terrain::TileType::Grass));
        world.add_agent(AgentProfile::default());
        let mut builder = SnapshotBuilder::new();
        let crafting = CraftingSystem::new();
        let economy = EconomySystem::new();
        let now = chrono::Utc::now();
        let first = builder.build(&world, 5, now, Vec::new(), &crafting, &economy);
        let second = builder.build(&world, 5, now, Vec::new(), &crafting, &economy);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn advancing_tick_produces_new_buffer() {
        let world = WorldState::new(TerrainGrid::new_flat(16, 16, crate::world::terrain::TileType::Grass));
        let mut builder = SnapshotBuilder::new();
        let crafting = CraftingSystem::new();
        let economy = EconomySystem::new();
        let now = chrono::Utc::now();
        let first = builder.build(&world, 1, now, Vec::new(), &crafting, &economy);
        let second = builder.build(&world, 2, now, Vec::new(), &crafting, &economy);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.tick, 2);
    }
}
