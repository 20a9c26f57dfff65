//! Thin operation layer over `WorldState`'s inventory storage
//! (`spec.md` §4.7 "Inventory operations"). Capacity checks happen here,
//! on add, never on remove.

use crate::errors::{CapacityError, SimResult};
use crate::ids::AgentId;
use crate::world::inventory::ResourceKind;
use crate::world::WorldState;

/// Adds `n` units of `kind` to `agent`'s inventory. `true` iff the full
/// amount was added; a partial/zero add due to capacity is reported as a
/// `CapacityError`, not silently truncated.
pub fn add_resource(world: &mut WorldState, agent: AgentId, kind: ResourceKind, n: u32) -> SimResult<bool> {
    let capacity = world
        .agent_inventory(agent)
        .ok_or(crate::errors::ValidationError::UnknownAgent(agent))?
        .capacity;
    let added = world.agent_inventory_mut(agent).map(|mut inv| inv.add(kind, n)).unwrap_or(0);
    if added < n {
        return Err(CapacityError::InventoryFull { agent, capacity }.into());
    }
    Ok(true)
}

pub fn remove_from_agent(world: &mut WorldState, agent: AgentId, kind: ResourceKind, n: u32) -> SimResult<u32> {
    world
        .agent_inventory_mut(agent)
        .map(|mut inv| inv.remove(kind, n))
        .ok_or_else(|| crate::errors::ValidationError::UnknownAgent(agent).into())
}

pub fn transfer(world: &mut WorldState, from: AgentId, to: AgentId, kind: ResourceKind, n: u32) -> u32 {
    world.transfer_between_agents(from, to, kind, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::terrain::TerrainGrid;
    use crate::world::AgentProfile;

    #[test]
    fn add_resource_reports_capacity_error_when_full() {
        let mut world = WorldState::new(TerrainGrid::new_flat(8, 8, crate::world::terrain::TileType::Grass));
        let id = world.add_agent(AgentProfile::default());
        world.agent_inventory_mut(id).unwrap().add(ResourceKind::Wood, 49);
        let err = add_resource(&mut world, id, ResourceKind::Wood, 5).unwrap_err();
        assert!(matches!(err, crate::errors::SimError::Capacity(CapacityError::InventoryFull { .. })));
    }
}
