//! `GoalContext`: the snapshot of everything a `GoalRule` may condition
//! on, rebuilt once per agent per decision interval (`spec.md` §4.9 step 1).

use crate::ids::{AgentId, ResourceId, ZoneId};
use crate::world::agent::Role;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeedKind {
    Hunger,
    Thirst,
    Energy,
    Hygiene,
    Social,
    Fun,
    MentalHealth,
}

impl NeedKind {
    pub const ALL: [NeedKind; 7] = [
        NeedKind::Hunger,
        NeedKind::Thirst,
        NeedKind::Energy,
        NeedKind::Hygiene,
        NeedKind::Social,
        NeedKind::Fun,
        NeedKind::MentalHealth,
    ];

    /// Social-family needs use the gentler priority curve (`spec.md` §4.5
    /// "pending-task generator").
    pub fn is_social_family(self) -> bool {
        matches!(self, NeedKind::Social | NeedKind::Fun | NeedKind::MentalHealth)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InventorySummary {
    pub load: u32,
    pub capacity: u32,
    pub has_food: bool,
    pub has_water: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GoalContext {
    pub agent: Option<AgentId>,
    pub position: Vec2,
    pub role: Option<Role>,
    pub needs: [f32; 7],
    pub inventory: InventorySummary,

    /// Copied from `NeedsConfig.critical_threshold` so the rule table's
    /// priority functions (bare `fn(&GoalContext) -> f32` pointers) can
    /// read the same threshold `NeedsSystem` uses, instead of duplicating
    /// the number.
    pub critical_threshold: f32,

    pub nearest_food: Option<(ResourceId, Vec2)>,
    pub nearest_water: Option<(ResourceId, Vec2)>,
    pub nearest_agent: Option<(AgentId, Vec2)>,
    pub nearest_enemy: Option<(AgentId, Vec2)>,

    pub is_in_combat: bool,
    pub nearby_predators: bool,
    pub has_enemies: bool,
    pub has_excess_resources: bool,
    pub craft_zone_id: Option<ZoneId>,
    pub deposit_zone_id: Option<ZoneId>,
    pub active_quest_goal: bool,
    pub contributable_building: bool,

    pub global_food_scarce: bool,
    pub global_water_scarce: bool,
    pub global_wood_scarce: bool,
    pub global_stone_scarce: bool,
}

impl GoalContext {
    pub fn need(&self, kind: NeedKind) -> f32 {
        self.needs[kind as usize]
    }
}
