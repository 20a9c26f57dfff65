//! Combat execution for `PrimitiveAction::Attack` (`spec.md` §2 "Supporting
//! systems", §6 "AGENT_COMMAND" combat override). Interface-level: one
//! flat-damage melee resolution plus the `is_in_combat` flag the AI
//! planner's `attack_enemy`/`flee_predator` rules condition on
//! (`spec.md` §4.9 step 1 "flags").

use crate::events::{DeathCause, EventLog, SimEvent};
use crate::ids::AgentId;
use crate::world::WorldState;
use std::collections::HashSet;

const ATTACK_DAMAGE: f32 = 8.0;
const ATTACK_RANGE: f32 = 3.0;

#[derive(Default)]
pub struct CombatSystem {
    /// Agents that landed or received a hit this tick; cleared every tick
    /// by the runner before systems run (`spec.md` §5 "per-tick event
    /// buffer" discipline applied to combat state).
    in_combat: HashSet<AgentId>,
}

impl CombatSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_tick_state(&mut self) {
        self.in_combat.clear();
    }

    pub fn is_in_combat(&self, agent: AgentId) -> bool {
        self.in_combat.contains(&agent)
    }

    /// Resolves one attack. Returns `true` if the blow landed (within
    /// range and target alive); out-of-range attacks are reported as
    /// `Failed` by the caller, not mutated here. A killing blow is
    /// reported via `pending_deaths` rather than mutated here — lifecycle
    /// is the sole writer of `is_dead` (`spec.md` §4.5 "Death"), the same
    /// path need-deaths and `KILL_AGENT` ride through `TickPipeline`.
    pub fn attack(&mut self, world: &mut WorldState, attacker: AgentId, target: AgentId, pending_deaths: &mut Vec<(AgentId, DeathCause)>, events: &mut EventLog) -> bool {
        let Some(attacker_pos) = world.get_agent(attacker).map(|a| a.position) else {
            return false;
        };
        let Some(target_pos) = world.get_agent(target).map(|a| a.position) else {
            return false;
        };
        if attacker_pos.distance(target_pos) > ATTACK_RANGE {
            return false;
        }
        self.in_combat.insert(attacker);
        self.in_combat.insert(target);

        let Some(mut victim) = world.get_agent_mut(target) else {
            return false;
        };
        // `is_dead` only flips once `LifecycleSystem::apply_deaths` runs the
        // pending death reported below, one tick later; guard on health too
        // so a victim already brought to zero doesn't get re-reported every
        // subsequent attack in the meantime.
        if victim.is_dead || victim.health <= 0.0 {
            return false;
        }
        victim.health = (victim.health - ATTACK_DAMAGE).max(0.0);
        let died = victim.health <= 0.0 && !victim.is_immortal;
        drop(victim);
        if died {
            pending_deaths.push((target, DeathCause::Combat));
            events.push(SimEvent::AgentDeath { agent: target, cause: DeathCause::Combat });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::terrain::TerrainGrid;
    use crate::world::AgentProfile;
    use glam::Vec2;

    #[test]
    fn attack_out_of_range_does_not_land() {
        let mut world = WorldState::new(TerrainGrid::new_flat(16, 16, crate::world::terrain::TileType::Grass));
        let a = world.add_agent(AgentProfile { position: Some(Vec2::ZERO), role: None });
        let b = world.add_agent(AgentProfile { position: Some(Vec2::new(100.0, 0.0)), role: None });
        let mut system = CombatSystem::new();
        let mut pending_deaths = Vec::new();
        let mut events = EventLog::default();
        assert!(!system.attack(&mut world, a, b, &mut pending_deaths, &mut events));
    }

    #[test]
    fn repeated_attacks_report_a_pending_death_without_mutating_is_dead() {
        // Lifecycle, not combat, owns `is_dead` (`spec.md` §4.5) — a
        // killing blow must surface through `pending_deaths` so
        // `LifecycleSystem::apply_deaths` can schedule respawn or removal
        // on the same path need-deaths and `KILL_AGENT` use.
        let mut world = WorldState::new(TerrainGrid::new_flat(16, 16, crate::world::terrain::TileType::Grass));
        let a = world.add_agent(AgentProfile { position: Some(Vec2::ZERO), role: None });
        let b = world.add_agent(AgentProfile { position: Some(Vec2::new(1.0, 0.0)), role: None });
        let mut system = CombatSystem::new();
        let mut pending_deaths = Vec::new();
        let mut events = EventLog::default();
        for _ in 0..20 {
            system.attack(&mut world, a, b, &mut pending_deaths, &mut events);
        }
        assert!(!world.get_agent(b).unwrap().is_dead, "combat must not mutate is_dead directly");
        assert_eq!(pending_deaths, vec![(b, DeathCause::Combat)]);
    }
}
