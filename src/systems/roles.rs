//! Role assignment (`spec.md` §2 "Supporting systems", GLOSSARY "Role").
//! Interface-level: idle agents are assigned the role with the greatest
//! unmet demand, biased by global resource scarcity, mirroring the
//! teacher's simple need-driven task assignment (`entities/wandering.rs`
//! picks a behavior from current world pressure rather than a learned
//! policy).

use crate::world::agent::Role;
use crate::world::inventory::ResourceKind;
use crate::world::WorldState;

const SCARCITY_THRESHOLD: u32 = 20;

/// Reassigns every living agent currently idle (`Role::Idle`) to the role
/// with the greatest current demand. Agents already holding a non-idle
/// role keep it — role changes are opt-in via the idle pool, not forced
/// churn.
pub fn assign_idle_roles(world: &mut WorldState) {
    let wood_scarce = world.global_materials.get(&ResourceKind::Wood).copied().unwrap_or(0) < SCARCITY_THRESHOLD;
    let stone_scarce = world.global_materials.get(&ResourceKind::Stone).copied().unwrap_or(0) < SCARCITY_THRESHOLD;
    let food_scarce = world.global_materials.get(&ResourceKind::Food).copied().unwrap_or(0) < SCARCITY_THRESHOLD;

    let desired = if food_scarce {
        Role::Farmer
    } else if wood_scarce {
        Role::Logger
    } else if stone_scarce {
        Role::Quarryman
    } else {
        Role::Gatherer
    };

    for id in world.living_agent_ids() {
        if let Some(mut agent) = world.get_agent_mut(id) {
            if agent.role == Role::Idle {
                agent.role = desired;
            }
        }
    }
}
