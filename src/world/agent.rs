//! Agent-related components. An `Agent` is a `bevy_ecs` entity carrying
//! these components; the entity handle is never exposed outside
//! `WorldState` — callers always address an agent by `AgentId` through
//! `EntityIndex` (`spec.md` §3 "Ownership summary").

use crate::ids::{AgentId, ZoneId};
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeStage {
    Child,
    Adult,
    Elder,
}

impl LifeStage {
    pub fn age_multiplier(self, needs_cfg: &crate::config::NeedsConfig) -> f32 {
        match self {
            LifeStage::Child => needs_cfg.age_multiplier_child,
            LifeStage::Adult => needs_cfg.age_multiplier_adult,
            LifeStage::Elder => needs_cfg.age_multiplier_elder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Role {
    Farmer,
    Logger,
    Quarryman,
    Hunter,
    Builder,
    Craftsman,
    Guard,
    Leader,
    Gatherer,
    Idle,
}

impl Role {
    /// Base salary amount for `handleSalaries` (`spec.md` §4.7, last-written
    /// values per the Open Questions resolution in §9(b)).
    pub fn base_salary(self) -> u32 {
        match self {
            Role::Farmer | Role::Logger | Role::Quarryman => 15,
            Role::Builder | Role::Craftsman => 20,
            Role::Guard | Role::Leader => 25,
            Role::Gatherer | Role::Hunter | Role::Idle => 10,
        }
    }

    pub fn is_warrior(self) -> bool {
        matches!(self, Role::Guard | Role::Leader)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Personality {
    pub diligence: f32,
    pub curiosity: f32,
    pub agreeableness: f32,
    pub neuroticism: f32,
    pub work_ethic: f32,
    pub exploration_type: ExplorationType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplorationType {
    Cautious,
    Balanced,
    Adventurous,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            diligence: 0.5,
            curiosity: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
            work_ethic: 0.5,
            exploration_type: ExplorationType::Balanced,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMemory {
    pub visited_zones: Vec<ZoneId>,
    pub failed_attempts: HashMap<String, u32>,
    pub home_zone_id: Option<ZoneId>,
    pub last_exploration_time: Option<u64>,
}

impl AgentMemory {
    pub fn record_failure(&mut self, key: &str) {
        *self.failed_attempts.entry(key.to_string()).or_insert(0) += 1;
    }
}

/// Core identity + physical/derived stats for an agent (`spec.md` §3 "Agent").
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub role: Role,
    pub life_stage: LifeStage,
    pub is_dead: bool,
    pub is_immortal: bool,
    pub health: f32,
    pub morale: f32,
    pub money: i64,
    pub personality: Personality,
    pub memory: AgentMemory,
    /// Tick at which a dead, respawn-scheduled agent should reinitialize.
    pub respawn_at_tick: Option<u64>,
}

impl Agent {
    pub fn new(id: AgentId, position: Vec2, role: Role) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            role,
            life_stage: LifeStage::Adult,
            is_dead: false,
            is_immortal: false,
            health: 100.0,
            morale: 50.0,
            money: 50,
            personality: Personality::default(),
            memory: AgentMemory::default(),
            respawn_at_tick: None,
        }
    }

    /// Same-id respawn contract (`spec.md` §9): keep the id, reset needs
    /// (handled by `NeedsSystem`), clear memory, mark alive.
    pub fn reinit_for_respawn(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.is_dead = false;
        self.health = 100.0;
        self.morale = 50.0;
        self.memory = AgentMemory::default();
        self.respawn_at_tick = None;
    }
}

/// Seven clamped need scalars (`spec.md` §3 "AgentNeeds"). Exclusively
/// owned and mutated by `NeedsSystem`.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentNeeds {
    pub hunger: f32,
    pub thirst: f32,
    pub energy: f32,
    pub hygiene: f32,
    pub social: f32,
    pub fun: f32,
    pub mental_health: f32,
}

impl Default for AgentNeeds {
    fn default() -> Self {
        Self {
            hunger: 100.0,
            thirst: 100.0,
            energy: 100.0,
            hygiene: 100.0,
            social: 100.0,
            fun: 100.0,
            mental_health: 100.0,
        }
    }
}

impl AgentNeeds {
    /// Invariant: values stay in [0,100] and are never NaN (`spec.md` §8.1).
    pub fn clamp_all(&mut self) {
        for v in self.as_mut_array() {
            if v.is_nan() {
                *v = 0.0;
            }
            *v = v.clamp(0.0, 100.0);
        }
    }

    pub fn as_mut_array(&mut self) -> [&mut f32; 7] {
        [
            &mut self.hunger,
            &mut self.thirst,
            &mut self.energy,
            &mut self.hygiene,
            &mut self.social,
            &mut self.fun,
            &mut self.mental_health,
        ]
    }

    pub fn lowest_value(&self) -> f32 {
        self.hunger
            .min(self.thirst)
            .min(self.energy)
            .min(self.hygiene)
            .min(self.social)
            .min(self.fun)
            .min(self.mental_health)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalType {
    SatisfyHunger,
    SatisfyThirst,
    Rest,
    Socialize,
    Work,
    Deposit,
    Craft,
    Hunt,
    Explore,
    Flee,
    Attack,
    Mate,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GoalTarget {
    Agent(AgentId),
    Resource(crate::ids::ResourceId),
    Zone(ZoneId),
    Position(Vec2),
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub goal_type: GoalType,
    pub target: GoalTarget,
    pub priority: f32,
    pub created_at_tick: u64,
    /// Arbitrary, goal-specific parameters (need type, resource kind, ...).
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveAction {
    Idle,
    Move,
    Harvest,
    Attack,
    Consume,
    Craft,
    Deposit,
    Socialize,
    Sleep,
    Mate,
}

/// AI state owned by the planner (`spec.md` §3 "AgentAIState").
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentAIState {
    pub current_goal: Option<Goal>,
    pub current_action: Option<PrimitiveAction>,
    pub task_queue: Vec<Goal>,
    pub last_decision_tick: u64,
    pub off_duty: bool,
}

/// Marker component distinguishing agent entities in ECS queries.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct AgentMarker;
