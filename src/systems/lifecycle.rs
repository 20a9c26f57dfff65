//! Aging, scheduled death, spawn queue, and respawn queue (`spec.md` §2
//! "Supporting systems" and §4.1 step 2 "Lifecycle update"). `NeedsSystem`
//! only *detects* a crossed death threshold; this system owns the
//! `is_dead` mutation and the respawn contract fixed by `spec.md` §9:
//! same id, reset needs, `is_dead=false`, memory cleared.

use crate::config::{LifecycleConfig, NeedsConfig};
use crate::events::{DeathCause, EventLog, SimEvent};
use crate::ids::AgentId;
use crate::world::agent::{AgentNeeds, LifeStage};
use crate::world::{AgentProfile, WorldState};
use std::collections::HashMap;

/// A request to spawn a new agent at the start of a future tick (`spec.md`
/// §6 `SPAWN_AGENT{profile?}`, queued rather than applied inline so
/// lifecycle remains the single writer of agent population changes).
pub struct SpawnRequest {
    pub profile: AgentProfile,
}

#[derive(Default)]
pub struct LifecycleSystem {
    spawn_queue: Vec<SpawnRequest>,
    age_ticks: HashMap<AgentId, u64>,
}

impl LifecycleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_spawn(&mut self, profile: AgentProfile) {
        self.spawn_queue.push(SpawnRequest { profile });
    }

    /// Applies all queued spawns, returning the new agent ids.
    pub fn drain_spawns(&mut self, world: &mut WorldState) -> Vec<AgentId> {
        self.spawn_queue
            .drain(..)
            .map(|req| {
                let id = world.add_agent(req.profile);
                self.age_ticks.insert(id, 0);
                id
            })
            .collect()
    }

    /// Marks newly-dead agents from `NeedsSystem::tick`'s output as dead,
    /// scheduling a respawn if enabled or permanently removing the agent
    /// otherwise (`spec.md` §3 "Agent" lifecycle, §4.5 "Death").
    pub fn apply_deaths(
        &mut self,
        world: &mut WorldState,
        needs_cfg: &NeedsConfig,
        newly_dead: &[(AgentId, DeathCause)],
        current_tick: u64,
        tick_rate_hz: f64,
        events: &mut EventLog,
    ) {
        let respawn_delay_ticks = (needs_cfg.respawn_delay.as_secs_f64() * tick_rate_hz).round() as u64;
        for &(id, _cause) in newly_dead {
            let Some(mut agent) = world.get_agent_mut(id) else {
                continue;
            };
            if agent.is_dead {
                continue;
            }
            agent.is_dead = true;
            if needs_cfg.respawn_enabled {
                agent.respawn_at_tick = Some(current_tick + respawn_delay_ticks);
            } else {
                agent.respawn_at_tick = None;
                drop(agent);
                world.remove_agent(id);
                self.age_ticks.remove(&id);
                continue;
            }
        }
        let _ = events;
    }

    /// Reinitializes any agent whose scheduled respawn tick has arrived.
    /// Keeps the same id per the fixed respawn contract (`spec.md` §9).
    pub fn tick_respawns(&mut self, world: &mut WorldState, current_tick: u64, events: &mut EventLog) {
        let due: Vec<AgentId> = world
            .all_agent_ids()
            .into_iter()
            .filter(|id| {
                world
                    .get_agent(*id)
                    .and_then(|a| a.respawn_at_tick)
                    .map(|at| at <= current_tick)
                    .unwrap_or(false)
            })
            .collect();

        for id in due {
            let Some(entity) = world.agent_entity(id) else {
                continue;
            };
            let spawn_position = world.get_agent(id).map(|a| a.position).unwrap_or_default();
            if let Some(mut agent) = world.get_agent_mut(id) {
                agent.reinit_for_respawn(spawn_position);
            }
            if let Some(mut needs) = world.ecs.get_mut::<AgentNeeds>(entity) {
                *needs = AgentNeeds::default();
            }
            self.age_ticks.insert(id, 0);
            events.push(SimEvent::AgentRespawned { agent: id });
        }
    }

    /// Advances age counters and transitions life stages (`spec.md` §3
    /// "Agent" `life_stage`).
    pub fn tick_aging(&mut self, world: &mut WorldState, cfg: &LifecycleConfig) {
        for id in world.living_agent_ids() {
            let age = self.age_ticks.entry(id).or_insert(0);
            *age += 1;
            let new_stage = if *age >= cfg.adult_to_elder_ticks {
                LifeStage::Elder
            } else if *age >= cfg.child_to_adult_ticks {
                LifeStage::Adult
            } else {
                LifeStage::Child
            };
            if let Some(mut agent) = world.get_agent_mut(id) {
                agent.life_stage = new_stage;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::agent::Role;
    use crate::world::terrain::TerrainGrid;

    fn make_world() -> WorldState {
        WorldState::new(TerrainGrid::new_flat(32, 32, crate::world::terrain::TileType::Grass))
    }

    #[test]
    fn death_with_respawn_enabled_schedules_reinit() {
        let mut world = make_world();
        let id = world.add_agent(AgentProfile { position: None, role: Some(Role::Idle) });
        let mut system = LifecycleSystem::new();
        let needs_cfg = NeedsConfig::default();
        let mut events = EventLog::default();
        system.apply_deaths(&mut world, &needs_cfg, &[(id, DeathCause::Starvation)], 100, 20.0, &mut events);
        let agent = world.get_agent(id).unwrap();
        assert!(agent.is_dead);
        assert!(agent.respawn_at_tick.is_some());
    }

    #[test]
    fn death_with_respawn_disabled_removes_agent() {
        let mut world = make_world();
        let id = world.add_agent(AgentProfile { position: None, role: Some(Role::Idle) });
        let mut system = LifecycleSystem::new();
        let mut needs_cfg = NeedsConfig::default();
        needs_cfg.respawn_enabled = false;
        let mut events = EventLog::default();
        system.apply_deaths(&mut world, &needs_cfg, &[(id, DeathCause::Dehydration)], 100, 20.0, &mut events);
        assert!(world.get_agent(id).is_none());
    }

    #[test]
    fn respawn_keeps_same_id_and_resets_needs() {
        let mut world = make_world();
        let id = world.add_agent(AgentProfile { position: None, role: Some(Role::Idle) });
        let entity = world.agent_entity(id).unwrap();
        world.ecs.get_mut::<AgentNeeds>(entity).unwrap().hunger = 0.0;
        world.get_agent_mut(id).unwrap().is_dead = true;
        world.get_agent_mut(id).unwrap().respawn_at_tick = Some(5);
        let mut system = LifecycleSystem::new();
        let mut events = EventLog::default();
        system.tick_respawns(&mut world, 5, &mut events);
        let agent = world.get_agent(id).unwrap();
        assert_eq!(agent.id, id);
        assert!(!agent.is_dead);
        let needs = world.ecs.get::<AgentNeeds>(entity).unwrap();
        assert_eq!(needs.hunger, 100.0);
    }
}
