//! `WorldState`: the single source of truth (`spec.md` §4.2). A
//! struct-of-arrays container built on a `bevy_ecs::World` — agents and
//! resources are ECS entities with components, while zones, terrain,
//! market, and the social graph are plain resources. All mutation flows
//! through the typed operations below; no system reaches into another
//! system's private state.

pub mod agent;
pub mod animal;
pub mod inventory;
pub mod market;
pub mod resource;
pub mod social;
pub mod terrain;
pub mod zone;

use crate::errors::ValidationError;
use crate::ids::{AgentId, AnimalId, IdAllocator, ResourceId, ZoneId};
use crate::index::entity_index::EntityIndex;
use crate::index::spatial_index::SpatialIndex;
use agent::{Agent, AgentAIState, AgentMarker, AgentNeeds, Role};
use animal::{Animal, AnimalKind, AnimalMarker};
use bevy_ecs::prelude::*;
use crate::systems::movement::MovementIntent;
use glam::Vec2;
use inventory::{Inventory, ResourceKind};
use market::Market;
use resource::{ResourceType, WorldResource};
use social::{EdgeKey, SocialEdge};
use std::collections::HashMap;
use terrain::TerrainGrid;
use zone::Zone;

/// An agent creation request (`spec.md` §6 `SPAWN_AGENT{profile?}`).
#[derive(Debug, Clone, Default)]
pub struct AgentProfile {
    pub position: Option<Vec2>,
    pub role: Option<Role>,
}

pub struct WorldState {
    pub ecs: World,
    pub entity_index: EntityIndex,
    pub spatial_index: SpatialIndex,
    pub zones: HashMap<ZoneId, Zone>,
    pub resources: HashMap<ResourceId, Entity>,
    pub animals: HashMap<AnimalId, Entity>,
    pub terrain: TerrainGrid,
    pub market: Market,
    pub social_graph: HashMap<EdgeKey, SocialEdge>,
    pub global_materials: HashMap<ResourceKind, u32>,
    pub tick: u64,

    agent_ids: IdAllocator,
    resource_ids: IdAllocator,
    zone_ids: IdAllocator,
    animal_ids: IdAllocator,
}

impl WorldState {
    pub fn new(terrain: TerrainGrid) -> Self {
        Self {
            ecs: World::new(),
            entity_index: EntityIndex::default(),
            spatial_index: SpatialIndex::new(16.0),
            zones: HashMap::new(),
            resources: HashMap::new(),
            animals: HashMap::new(),
            terrain,
            market: Market::default(),
            social_graph: HashMap::new(),
            global_materials: HashMap::new(),
            tick: 0,
            agent_ids: IdAllocator::new(),
            resource_ids: IdAllocator::new(),
            zone_ids: IdAllocator::new(),
            animal_ids: IdAllocator::new(),
        }
    }

    // -- Agents -----------------------------------------------------

    pub fn add_agent(&mut self, profile: AgentProfile) -> AgentId {
        let id = AgentId::from_raw(self.agent_ids.next_raw());
        let position = profile.position.unwrap_or(Vec2::ZERO);
        let role = profile.role.unwrap_or(Role::Idle);
        let entity = self
            .ecs
            .spawn((
                AgentMarker,
                Agent::new(id, position, role),
                AgentNeeds::default(),
                AgentAIState::default(),
                Inventory::new(50),
                MovementIntent::default(),
            ))
            .id();
        self.entity_index.insert_agent(id, entity, position);
        self.spatial_index.insert_agent(id, position);
        id
    }

    pub fn get_agent(&self, id: AgentId) -> Option<&Agent> {
        let entity = self.entity_index.agent_entity(id)?;
        self.ecs.get::<Agent>(entity)
    }

    pub fn get_agent_mut(&mut self, id: AgentId) -> Option<Mut<'_, Agent>> {
        let entity = self.entity_index.agent_entity(id)?;
        self.ecs.get_mut::<Agent>(entity)
    }

    pub fn get_agent_checked(&self, id: AgentId) -> Result<&Agent, ValidationError> {
        self.get_agent(id).ok_or(ValidationError::UnknownAgent(id))
    }

    pub fn agent_entity(&self, id: AgentId) -> Option<Entity> {
        self.entity_index.agent_entity(id)
    }

    pub fn remove_agent(&mut self, id: AgentId) {
        if let Some(entity) = self.entity_index.remove_agent(id) {
            self.ecs.despawn(entity);
        }
        self.spatial_index.remove_agent(id);
    }

    pub fn living_agent_ids(&self) -> Vec<AgentId> {
        self.entity_index
            .agent_ids()
            .filter(|id| self.get_agent(*id).map(|a| !a.is_dead).unwrap_or(false))
            .collect()
    }

    pub fn all_agent_ids(&self) -> Vec<AgentId> {
        self.entity_index.agent_ids().collect()
    }

    // -- Resources ----------------------------------------------------

    pub fn add_world_resource(&mut self, kind: ResourceType, position: Vec2) -> ResourceId {
        let id = ResourceId::from_raw(self.resource_ids.next_raw());
        let initial_yield = kind.base_yield() * 4.0;
        let entity = self.ecs.spawn(WorldResource::new(id, kind, position, initial_yield)).id();
        self.resources.insert(id, entity);
        self.spatial_index.insert_resource(id, position);
        id
    }

    pub fn get_resource(&self, id: ResourceId) -> Option<&WorldResource> {
        let entity = *self.resources.get(&id)?;
        self.ecs.get::<WorldResource>(entity)
    }

    pub fn get_resource_mut(&mut self, id: ResourceId) -> Option<Mut<'_, WorldResource>> {
        let entity = *self.resources.get(&id)?;
        self.ecs.get_mut::<WorldResource>(entity)
    }

    pub fn resources_by_type(&self, kind: ResourceType) -> Vec<ResourceId> {
        self.resources
            .keys()
            .copied()
            .filter(|id| self.get_resource(*id).map(|r| r.kind == kind).unwrap_or(false))
            .collect()
    }

    pub fn mark_resource_depleted(&mut self, id: ResourceId) {
        if let Some(mut res) = self.get_resource_mut(id) {
            res.harvest(res.remaining_yield);
        }
    }

    // -- Animals ----------------------------------------------------------

    pub fn add_animal(&mut self, kind: AnimalKind, position: Vec2) -> AnimalId {
        let id = AnimalId::from_raw(self.animal_ids.next_raw());
        let entity = self.ecs.spawn((AnimalMarker, Animal::new(id, kind, position))).id();
        self.animals.insert(id, entity);
        self.spatial_index.insert_animal(id, position);
        id
    }

    pub fn get_animal(&self, id: AnimalId) -> Option<&Animal> {
        let entity = *self.animals.get(&id)?;
        self.ecs.get::<Animal>(entity)
    }

    pub fn get_animal_mut(&mut self, id: AnimalId) -> Option<Mut<'_, Animal>> {
        let entity = *self.animals.get(&id)?;
        self.ecs.get_mut::<Animal>(entity)
    }

    pub fn remove_animal(&mut self, id: AnimalId) {
        if let Some(entity) = self.animals.remove(&id) {
            self.ecs.despawn(entity);
        }
        self.spatial_index.remove_animal(id);
    }

    pub fn living_animal_ids(&self) -> Vec<AnimalId> {
        self.animals
            .keys()
            .copied()
            .filter(|id| self.get_animal(*id).map(|a| !a.is_dead).unwrap_or(false))
            .collect()
    }

    // -- Zones ----------------------------------------------------------

    pub fn add_zone(&mut self, zone_type: zone::ZoneType, bounds: zone::Aabb, capacity: u32) -> ZoneId {
        let id = ZoneId::from_raw(self.zone_ids.next_raw());
        self.zones.insert(id, Zone::new(id, zone_type, bounds, capacity));
        id
    }

    pub fn zone_at(&self, position: Vec2) -> Option<&Zone> {
        self.zones.values().find(|z| z.contains(position))
    }

    // -- Inventory convenience -------------------------------------------

    pub fn agent_inventory(&self, id: AgentId) -> Option<&Inventory> {
        let entity = self.entity_index.agent_entity(id)?;
        self.ecs.get::<Inventory>(entity)
    }

    pub fn agent_inventory_mut(&mut self, id: AgentId) -> Option<Mut<'_, Inventory>> {
        let entity = self.entity_index.agent_entity(id)?;
        self.ecs.get_mut::<Inventory>(entity)
    }

    /// Transfers `amount` of `kind` between two agent inventories.
    /// Exactly conservative: the amount removed from `from` equals the
    /// amount added to `to` (`spec.md` §8.2).
    pub fn transfer_between_agents(
        &mut self,
        from: AgentId,
        to: AgentId,
        kind: ResourceKind,
        amount: u32,
    ) -> u32 {
        let removed = self
            .agent_inventory_mut(from)
            .map(|mut inv| inv.remove(kind, amount))
            .unwrap_or(0);
        if removed == 0 {
            return 0;
        }
        let added = self
            .agent_inventory_mut(to)
            .map(|mut inv| inv.add(kind, removed))
            .unwrap_or(0);
        let leftover = removed - added;
        if leftover > 0 {
            // Capacity-limited on the receiving side: give back to sender
            // so the conservation invariant holds exactly.
            if let Some(mut inv) = self.agent_inventory_mut(from) {
                inv.add(kind, leftover);
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_world() -> WorldState {
        WorldState::new(TerrainGrid::new_flat(64, 64, terrain::TileType::Grass))
    }

    #[test]
    fn add_and_fetch_agent() {
        let mut world = make_world();
        let id = world.add_agent(AgentProfile { position: Some(Vec2::new(10.0, 10.0)), role: None });
        let agent = world.get_agent(id).unwrap();
        assert_eq!(agent.position, Vec2::new(10.0, 10.0));
        assert!(!agent.is_dead);
    }

    #[test]
    fn remove_agent_clears_index() {
        let mut world = make_world();
        let id = world.add_agent(AgentProfile::default());
        world.remove_agent(id);
        assert!(world.get_agent(id).is_none());
        assert!(world.entity_index.agent_entity(id).is_none());
    }

    #[test]
    fn transfer_conserves_total() {
        let mut world = make_world();
        let a = world.add_agent(AgentProfile::default());
        let b = world.add_agent(AgentProfile::default());
        world.agent_inventory_mut(a).unwrap().add(ResourceKind::Wood, 10);
        let before = world.agent_inventory(a).unwrap().get(ResourceKind::Wood)
            + world.agent_inventory(b).unwrap().get(ResourceKind::Wood);
        world.transfer_between_agents(a, b, ResourceKind::Wood, 4);
        let after = world.agent_inventory(a).unwrap().get(ResourceKind::Wood)
            + world.agent_inventory(b).unwrap().get(ResourceKind::Wood);
        assert_eq!(before, after);
    }
}
