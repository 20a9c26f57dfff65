//! Goal completion/invalidation predicates (`spec.md` §4.9 step 2).
//!
//! Resource goals complete only after a successful harvest, never merely
//! on arrival — the bugfix called out explicitly in `spec.md` §9.

use crate::ai::context::NeedKind;
use crate::config::NeedsConfig;
use crate::ids::AgentId;
use crate::world::agent::{Goal, GoalTarget, GoalType};
use crate::world::WorldState;

const MAX_GOAL_AGE_TICKS: u64 = 60 * 20; // 60s at the default 20Hz tick rate.

pub struct AIGoalValidator;

impl AIGoalValidator {
    /// `harvested_this_tick`/`arrived` are reported by the action executor
    /// for the tick just completed.
    pub fn is_completed(
        &self,
        goal: &Goal,
        world: &WorldState,
        agent: AgentId,
        needs_cfg: &NeedsConfig,
        arrived: bool,
        harvested_this_tick: bool,
    ) -> bool {
        if world.get_agent(agent).is_none() {
            return true;
        }
        match goal.goal_type {
            GoalType::SatisfyHunger => self.need_satisfied(world, agent, NeedKind::Hunger, needs_cfg),
            GoalType::SatisfyThirst => self.need_satisfied(world, agent, NeedKind::Thirst, needs_cfg),
            GoalType::Rest => self.need_satisfied(world, agent, NeedKind::Energy, needs_cfg),
            GoalType::Hunt | GoalType::Work => arrived && harvested_this_tick,
            GoalType::Socialize => arrived,
            GoalType::Deposit => arrived,
            GoalType::Craft => arrived,
            GoalType::Explore => arrived,
            // Flee completes once the threat that triggered it is gone;
            // the planner re-evaluates rules every interval regardless,
            // so treat it as never self-completing here.
            GoalType::Flee => false,
            GoalType::Attack | GoalType::Mate | GoalType::Idle => arrived,
        }
    }

    fn need_satisfied(&self, world: &WorldState, agent: AgentId, kind: NeedKind, cfg: &NeedsConfig) -> bool {
        let entity = match world.agent_entity(agent) {
            Some(e) => e,
            None => return true,
        };
        let Some(needs) = world.ecs.get::<crate::world::agent::AgentNeeds>(entity) else {
            return true;
        };
        let value = match kind {
            NeedKind::Hunger => needs.hunger,
            NeedKind::Thirst => needs.thirst,
            NeedKind::Energy => needs.energy,
            NeedKind::Hygiene => needs.hygiene,
            NeedKind::Social => needs.social,
            NeedKind::Fun => needs.fun,
            NeedKind::MentalHealth => needs.mental_health,
        };
        value > cfg.satisfied_threshold
    }

    pub fn is_invalid(&self, goal: &Goal, world: &WorldState, current_tick: u64) -> bool {
        if current_tick.saturating_sub(goal.created_at_tick) > MAX_GOAL_AGE_TICKS {
            return true;
        }
        match goal.target {
            GoalTarget::Agent(id) => world.get_agent(id).map(|a| a.is_dead).unwrap_or(true),
            GoalTarget::Resource(id) => world
                .get_resource(id)
                .map(|r| r.state == crate::world::resource::ResourceState::Depleted)
                .unwrap_or(true),
            GoalTarget::Zone(id) => !world.zones.contains_key(&id),
            GoalTarget::Position(_) | GoalTarget::None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{agent::Role, terrain::TerrainGrid, AgentProfile};

    #[test]
    fn goal_targeting_a_dead_agent_is_invalid() {
        let mut world = WorldState::new(TerrainGrid::new_flat(8, 8, crate::world::terrain::TileType::Grass));
        let a = world.add_agent(AgentProfile { position: None, role: Some(Role::Idle) });
        world.get_agent_mut(a).unwrap().is_dead = true;
        let goal = Goal {
            goal_type: GoalType::Socialize,
            target: GoalTarget::Agent(a),
            priority: 0.5,
            created_at_tick: 0,
            params: Default::default(),
        };
        let validator = AIGoalValidator;
        assert!(validator.is_invalid(&goal, &world, 1));
    }

    #[test]
    fn goal_expires_after_max_age() {
        let world = WorldState::new(TerrainGrid::new_flat(8, 8, crate::world::terrain::TileType::Grass));
        let goal = Goal {
            goal_type: GoalType::Explore,
            target: GoalTarget::None,
            priority: 0.2,
            created_at_tick: 0,
            params: Default::default(),
        };
        let validator = AIGoalValidator;
        assert!(validator.is_invalid(&goal, &world, MAX_GOAL_AGE_TICKS + 1));
    }
}
