//! Per-tick need decay, consumption, zone bonuses, cross-effects, and the
//! pending-task generator (`spec.md` §4.5 "NeedsSystem").

use crate::ai::context::NeedKind;
use crate::config::{LifecycleConfig, NeedsConfig};
use crate::events::{DeathCause, EventLog, SimEvent};
use crate::ids::AgentId;
use crate::world::agent::{AgentNeeds, PrimitiveAction};
use crate::world::inventory::ResourceKind;
use crate::world::resource::ResourceType;
use crate::world::zone::ZoneType;
use crate::world::WorldState;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskDescriptor {
    pub agent: AgentId,
    pub need: NeedKind,
    pub priority: f32,
}

/// `calculatePriority` from `spec.md` §4.5: survival needs use the steep
/// curve, social-family needs the gentler one.
pub fn calculate_priority(value: f32, need: NeedKind, cfg: &NeedsConfig) -> f32 {
    crate::ai::rules::calculate_priority(value, need.is_social_family(), cfg.critical_threshold)
}

/// Fixed per-agent inputs to one decay pass, gathered once up front so
/// they can feed either the scalar or the batch path below.
struct AgentDecayContext {
    id: AgentId,
    entity: bevy_ecs::entity::Entity,
    position: glam::Vec2,
    is_immortal: bool,
    age_mult: f32,
    energy_action_mult: f32,
}

/// The decay + cross-effects kernel (`spec.md` §4.5), factored out so the
/// scalar path (small populations) and the batch path (dense-array sweep
/// for `agent_count >= batch_threshold`) apply exactly the same math.
fn decay_kernel(needs: &mut AgentNeeds, cfg: &NeedsConfig, age_mult: f32, energy_action_mult: f32, dt_secs: f32) {
    needs.hunger -= cfg.decay_rate_hunger * age_mult * dt_secs;
    needs.thirst -= cfg.decay_rate_thirst * age_mult * dt_secs;
    needs.energy -= cfg.decay_rate_energy * age_mult * energy_action_mult * dt_secs;
    needs.hygiene -= cfg.decay_rate_hygiene * age_mult * dt_secs;
    needs.social -= cfg.decay_rate_social * age_mult * dt_secs;
    needs.fun -= cfg.decay_rate_fun * age_mult * dt_secs;
    needs.mental_health -= cfg.decay_rate_mental_health * age_mult * dt_secs;

    if needs.energy < 30.0 {
        needs.social -= cfg.decay_rate_social * age_mult * dt_secs * 0.5;
        needs.fun -= cfg.decay_rate_fun * age_mult * dt_secs * 0.5;
        needs.mental_health -= cfg.decay_rate_mental_health * age_mult * dt_secs * 0.5;
    }
    if needs.hunger < 40.0 || needs.thirst < 30.0 {
        needs.energy -= cfg.decay_rate_energy * age_mult * dt_secs * 0.5;
    }
    needs.clamp_all();
}

/// Holds the sub-tick accumulator so decay only applies once per
/// `update_interval`, independent of the runner's tick rate.
#[derive(Default)]
pub struct NeedsSystem {
    elapsed_since_update: Duration,
}

impl NeedsSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances needs for every living agent. Returns the ids that
    /// crossed a death threshold this call; the lifecycle system (not
    /// this one) mutates `is_dead` for those (`spec.md` §4.5 "Death").
    pub fn tick(&mut self, world: &mut WorldState, cfg: &NeedsConfig, lifecycle: &LifecycleConfig, dt: Duration, events: &mut EventLog) -> Vec<(AgentId, DeathCause)> {
        self.elapsed_since_update += dt;
        if self.elapsed_since_update < cfg.update_interval {
            return Vec::new();
        }
        let dt_secs = self.elapsed_since_update.as_secs_f32();
        self.elapsed_since_update = Duration::ZERO;

        let agent_ids = world.living_agent_ids();
        let contexts: Vec<AgentDecayContext> = agent_ids.into_iter().filter_map(|id| self.gather_context(world, id, cfg)).collect();

        // Batch fast path (`spec.md` §4.5 "Batch fast path"): once the
        // living population reaches `batch_threshold`, rebuild a dense
        // needs array, run the decay kernel over it in one sweep, then
        // scatter the results back, instead of interleaving an ECS
        // get/mutate pair per agent.
        if contexts.len() >= cfg.batch_threshold {
            let mut dense: Vec<AgentNeeds> =
                contexts.iter().filter_map(|ctx| world.ecs.get::<AgentNeeds>(ctx.entity).copied()).collect();
            for (needs, ctx) in dense.iter_mut().zip(&contexts) {
                decay_kernel(needs, cfg, ctx.age_mult, ctx.energy_action_mult, dt_secs);
            }
            for (needs, ctx) in dense.into_iter().zip(&contexts) {
                if let Some(mut slot) = world.ecs.get_mut::<AgentNeeds>(ctx.entity) {
                    *slot = needs;
                }
            }
        } else {
            for ctx in &contexts {
                if let Some(mut needs) = world.ecs.get_mut::<AgentNeeds>(ctx.entity) {
                    decay_kernel(&mut needs, cfg, ctx.age_mult, ctx.energy_action_mult, dt_secs);
                }
            }
        }

        let mut newly_dead = Vec::new();
        for ctx in contexts {
            if let Some(cause) = self.post_decay(world, ctx.id, ctx.entity, ctx.position, ctx.is_immortal, cfg, lifecycle, events) {
                newly_dead.push((ctx.id, cause));
                events.push(SimEvent::AgentDeath { agent: ctx.id, cause });
            }
        }
        newly_dead
    }

    /// Collects the per-agent inputs the decay kernel needs (age/action
    /// multipliers) and the position/immortality the post-decay pass
    /// needs, in one ECS read, shared by both the scalar and batch paths.
    fn gather_context(&self, world: &WorldState, id: AgentId, cfg: &NeedsConfig) -> Option<AgentDecayContext> {
        let entity = world.agent_entity(id)?;
        let (life_stage, position, is_immortal) = {
            let agent = world.ecs.get::<crate::world::agent::Agent>(entity)?;
            (agent.life_stage, agent.position, agent.is_immortal)
        };
        let current_action = world.ecs.get::<crate::world::agent::AgentAIState>(entity).and_then(|s| s.current_action);
        let age_mult = life_stage.age_multiplier(cfg);
        let energy_action_mult = match current_action {
            Some(PrimitiveAction::Sleep) => cfg.energy_action_multiplier_sleep,
            Some(PrimitiveAction::Move) => cfg.energy_action_multiplier_move,
            Some(PrimitiveAction::Craft) | Some(PrimitiveAction::Harvest) => cfg.energy_action_multiplier_work,
            _ => cfg.energy_action_multiplier_idle,
        };
        Some(AgentDecayContext { id, entity, position, is_immortal, age_mult, energy_action_mult })
    }

    /// Zone bonus, consumption/gather, and death-threshold check for one
    /// agent, run after decay regardless of which decay path was taken.
    /// These steps read per-agent position/zone/inventory state that
    /// doesn't vectorize against the rest of the world, so they stay a
    /// per-agent pass (`spec.md` §4.5).
    fn post_decay(
        &self,
        world: &mut WorldState,
        id: AgentId,
        entity: bevy_ecs::entity::Entity,
        position: glam::Vec2,
        is_immortal: bool,
        cfg: &NeedsConfig,
        lifecycle: &LifecycleConfig,
        events: &mut EventLog,
    ) -> Option<DeathCause> {
        if let Some(zone) = world.zone_at(position) {
            let bonus = match zone.zone_type {
                ZoneType::Hygiene => Some((cfg.zone_bonus_hygiene, 0)),
                ZoneType::Social => Some((cfg.zone_bonus_social, 1)),
                ZoneType::Fun => Some((cfg.zone_bonus_fun, 2)),
                ZoneType::Mental => Some((cfg.zone_bonus_mental, 3)),
                _ => None,
            };
            if let Some((amount, slot)) = bonus {
                if let Some(mut needs) = world.ecs.get_mut::<AgentNeeds>(entity) {
                    match slot {
                        0 => needs.hygiene = (needs.hygiene + amount).min(100.0),
                        1 => needs.social = (needs.social + amount).min(100.0),
                        2 => needs.fun = (needs.fun + amount).min(100.0),
                        _ => needs.mental_health = (needs.mental_health + amount).min(100.0),
                    }
                }
            }
        }

        self.consume(world, id, entity, position, cfg, events);

        let needs = world.ecs.get::<AgentNeeds>(entity)?;
        if is_immortal {
            return None;
        }
        if needs.hunger <= lifecycle.hunger_death_threshold {
            Some(DeathCause::Starvation)
        } else if needs.thirst <= lifecycle.thirst_death_threshold {
            Some(DeathCause::Dehydration)
        } else if needs.energy <= lifecycle.energy_death_threshold {
            Some(DeathCause::Exhaustion)
        } else {
            None
        }
    }

    /// Consumption + opportunistic short-range gather (`spec.md` §4.5
    /// "Consumption").
    fn consume(
        &self,
        world: &mut WorldState,
        id: AgentId,
        entity: bevy_ecs::entity::Entity,
        position: glam::Vec2,
        cfg: &NeedsConfig,
        events: &mut EventLog,
    ) {
        let hunger = world.ecs.get::<AgentNeeds>(entity).map(|n| n.hunger).unwrap_or(100.0);
        if hunger < 70.0 {
            let urgency = if hunger < 50.0 { 2 } else { 1 };
            self.consume_or_gather(world, id, entity, position, ResourceKind::Food, ResourceType::BerryBush, urgency, cfg.hunger_consume_restore, events, true);
        }
        let thirst = world.ecs.get::<AgentNeeds>(entity).map(|n| n.thirst).unwrap_or(100.0);
        if thirst < 70.0 {
            let urgency = if thirst < 50.0 { 2 } else { 1 };
            self.consume_or_gather(world, id, entity, position, ResourceKind::Water, ResourceType::WaterSource, urgency, cfg.thirst_consume_restore, events, false);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn consume_or_gather(
        &self,
        world: &mut WorldState,
        id: AgentId,
        entity: bevy_ecs::entity::Entity,
        position: glam::Vec2,
        kind: ResourceKind,
        gather_from: ResourceType,
        urgency: u32,
        restore_per_unit: f32,
        events: &mut EventLog,
        is_hunger: bool,
    ) {
        let stock = world.ecs.get::<crate::world::inventory::Inventory>(entity).map(|inv| inv.get(kind)).unwrap_or(0);
        let mut consumed = 0;
        if stock > 0 {
            if let Some(mut inv) = world.ecs.get_mut::<crate::world::inventory::Inventory>(entity) {
                consumed = inv.remove(kind, urgency.min(stock));
            }
        } else {
            consumed = self.short_range_gather(world, id, entity, position, kind, gather_from, events);
        }
        if consumed > 0 {
            if let Some(mut needs) = world.ecs.get_mut::<AgentNeeds>(entity) {
                let restore = restore_per_unit * consumed as f32;
                if is_hunger {
                    needs.hunger = (needs.hunger + restore).min(100.0);
                } else {
                    needs.thirst = (needs.thirst + restore).min(100.0);
                }
            }
        }
    }

    fn short_range_gather(
        &self,
        world: &mut WorldState,
        _id: AgentId,
        _entity: bevy_ecs::entity::Entity,
        position: glam::Vec2,
        _kind: ResourceKind,
        gather_from: ResourceType,
        events: &mut EventLog,
    ) -> u32 {
        const GATHER_RADIUS: f32 = 40.0;
        let hit = world
            .spatial_index
            .query_radius(position, GATHER_RADIUS, |sid| {
                sid.as_resource().and_then(|rid| world.get_resource(rid)).map(|r| r.kind == gather_from).unwrap_or(false)
            })
            .into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((sid, _)) = hit else {
            return 0;
        };
        let Some(resource_id) = sid.as_resource() else {
            return 0;
        };
        let harvested = world.get_resource_mut(resource_id).map(|mut r| r.harvest(1.0)).unwrap_or(0.0);
        if harvested <= 0.0 {
            return 0;
        }
        if world.get_resource(resource_id).map(|r| r.state == crate::world::resource::ResourceState::Depleted).unwrap_or(false) {
            events.push(SimEvent::ResourceDepleted { resource: resource_id });
        }
        // `spec.md` §4.5 "Consumption": a successful gather is followed
        // *immediately* by a consume — the unit is never parked in the
        // agent's inventory, or a later tick's `stock > 0` branch would
        // consume it again and restore the need a second time for the
        // same harvest.
        1
    }

    /// Applies `SocialSystem`'s per-agent morale bonus to `social` and
    /// `fun`. Kept here rather than in `social.rs` so `AgentNeeds` is
    /// mutated exclusively by this system (`spec.md` §4.8 "Morale boost").
    pub fn apply_morale_bonus(&self, world: &mut WorldState, bonuses: &std::collections::HashMap<AgentId, f32>) {
        for (&id, &bonus) in bonuses {
            let Some(entity) = world.agent_entity(id) else { continue };
            if let Some(mut needs) = world.ecs.get_mut::<AgentNeeds>(entity) {
                needs.social = (needs.social + bonus).min(100.0);
                needs.fun = (needs.fun + bonus).min(100.0);
            }
        }
    }

    /// `getPendingTasks(agentId, ...)`: the sole producer of need-driven
    /// tasks (`spec.md` §4.5 "Pending-task generator").
    pub fn pending_tasks(&self, world: &WorldState, id: AgentId, cfg: &NeedsConfig) -> Vec<TaskDescriptor> {
        let Some(entity) = world.agent_entity(id) else {
            return Vec::new();
        };
        let Some(needs) = world.ecs.get::<AgentNeeds>(entity) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for kind in NeedKind::ALL {
            let value = match kind {
                NeedKind::Hunger => needs.hunger,
                NeedKind::Thirst => needs.thirst,
                NeedKind::Energy => needs.energy,
                NeedKind::Hygiene => needs.hygiene,
                NeedKind::Social => needs.social,
                NeedKind::Fun => needs.fun,
                NeedKind::MentalHealth => needs.mental_health,
            };
            if value < cfg.low_threshold {
                out.push(TaskDescriptor { agent: id, need: kind, priority: calculate_priority(value, kind, cfg) });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::agent::Role;
    use crate::world::terrain::TerrainGrid;
    use crate::world::AgentProfile;

    fn make_world() -> WorldState {
        WorldState::new(TerrainGrid::new_flat(32, 32, crate::world::terrain::TileType::Grass))
    }

    #[test]
    fn decay_reduces_needs_over_an_update_interval() {
        let mut world = make_world();
        let id = world.add_agent(AgentProfile { position: Some(glam::Vec2::new(500.0, 500.0)), role: Some(Role::Idle) });
        let mut system = NeedsSystem::new();
        let cfg = NeedsConfig::default();
        let lifecycle = LifecycleConfig::default();
        let mut events = EventLog::default();
        system.tick(&mut world, &cfg, &lifecycle, cfg.update_interval, &mut events);
        let entity = world.agent_entity(id).unwrap();
        let needs = world.ecs.get::<AgentNeeds>(entity).unwrap();
        assert!(needs.hunger < 100.0);
        assert!(needs.thirst < 100.0);
    }

    #[test]
    fn immortal_agent_never_reported_dead() {
        let mut world = make_world();
        let id = world.add_agent(AgentProfile { position: Some(glam::Vec2::new(500.0, 500.0)), role: Some(Role::Idle) });
        world.get_agent_mut(id).unwrap().is_immortal = true;
        let entity = world.agent_entity(id).unwrap();
        world.ecs.get_mut::<AgentNeeds>(entity).unwrap().hunger = 0.0;
        let mut system = NeedsSystem::new();
        let cfg = NeedsConfig::default();
        let lifecycle = LifecycleConfig::default();
        let mut events = EventLog::default();
        let dead = system.tick(&mut world, &cfg, &lifecycle, cfg.update_interval, &mut events);
        assert!(dead.is_empty());
    }

    #[test]
    fn batch_path_matches_scalar_path_within_float_tolerance() {
        // `spec.md` §9: results must be equivalent whether the scalar or
        // batch-vectorized path is taken. Run identical starting needs
        // through each by crossing `batch_threshold` with the population
        // size, and compare the decayed values.
        let mut cfg = NeedsConfig::default();
        cfg.batch_threshold = 5;
        cfg.update_interval = Duration::ZERO;
        let lifecycle = LifecycleConfig::default();

        let mut scalar_world = make_world();
        let scalar_agent = scalar_world.add_agent(AgentProfile { position: Some(glam::Vec2::new(500.0, 500.0)), role: Some(Role::Idle) });
        let mut scalar_system = NeedsSystem::new();
        let mut events = EventLog::default();
        scalar_system.tick(&mut scalar_world, &cfg, &lifecycle, Duration::from_secs(1), &mut events);
        let scalar_needs = *scalar_world.ecs.get::<AgentNeeds>(scalar_world.agent_entity(scalar_agent).unwrap()).unwrap();

        let mut batch_world = make_world();
        let mut batch_agents = Vec::new();
        for _ in 0..cfg.batch_threshold {
            batch_agents.push(batch_world.add_agent(AgentProfile { position: Some(glam::Vec2::new(500.0, 500.0)), role: Some(Role::Idle) }));
        }
        let mut batch_system = NeedsSystem::new();
        let mut events = EventLog::default();
        batch_system.tick(&mut batch_world, &cfg, &lifecycle, Duration::from_secs(1), &mut events);
        for &id in &batch_agents {
            let needs = *batch_world.ecs.get::<AgentNeeds>(batch_world.agent_entity(id).unwrap()).unwrap();
            assert!((needs.hunger - scalar_needs.hunger).abs() < 1e-4);
            assert!((needs.thirst - scalar_needs.thirst).abs() < 1e-4);
            assert!((needs.energy - scalar_needs.energy).abs() < 1e-4);
        }
    }

    #[test]
    fn pending_tasks_only_below_low_threshold() {
        let mut world = make_world();
        let id = world.add_agent(AgentProfile::default());
        let entity = world.agent_entity(id).unwrap();
        world.ecs.get_mut::<AgentNeeds>(entity).unwrap().hunger = 10.0;
        let cfg = NeedsConfig::default();
        let system = NeedsSystem::new();
        let tasks = system.pending_tasks(&world, id, &cfg);
        assert!(tasks.iter().any(|t| t.need == NeedKind::Hunger && t.priority > 0.9));
    }

    #[test]
    fn opportunistic_gather_restores_need_without_leaving_inventory_residue() {
        // `spec.md` §4.5: a gather triggered by an empty inventory is
        // followed *immediately* by a consume. The harvested unit must
        // not persist in inventory, or a later tick's `stock > 0` branch
        // would consume it again and restore the need a second time for
        // the same harvest, breaking conservation (invariant 3).
        let mut world = make_world();
        let id = world.add_agent(AgentProfile { position: Some(glam::Vec2::new(10.0, 10.0)), role: Some(Role::Idle) });
        world.add_world_resource(ResourceType::BerryBush, glam::Vec2::new(15.0, 10.0));
        let entity = world.agent_entity(id).unwrap();
        world.ecs.get_mut::<AgentNeeds>(entity).unwrap().hunger = 10.0;

        let mut system = NeedsSystem::new();
        let cfg = NeedsConfig::default();
        let lifecycle = LifecycleConfig::default();
        let mut events = EventLog::default();
        system.tick(&mut world, &cfg, &lifecycle, cfg.update_interval, &mut events);

        let hunger_after = world.ecs.get::<AgentNeeds>(entity).unwrap().hunger;
        assert!(hunger_after > 10.0, "an opportunistic gather should restore hunger");
        assert_eq!(
            world.agent_inventory(id).unwrap().get(ResourceKind::Food),
            0,
            "a gather-then-consume must not leave the harvested unit in inventory"
        );
    }
}
