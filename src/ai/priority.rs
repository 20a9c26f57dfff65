//! Domain weighting and situational modifiers (`spec.md` §4.10
//! "PriorityManager").

use crate::ai::context::GoalContext;
use crate::world::agent::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalCategory {
    Survival,
    Flee,
    Rest,
    Combat,
    Crafting,
    Work,
    Logistics,
    Social,
    Explore,
    Inspect,
}

impl GoalCategory {
    fn base_weight(self) -> f32 {
        match self {
            GoalCategory::Survival => 1.0,
            GoalCategory::Flee => 1.1,
            GoalCategory::Rest => 0.8,
            GoalCategory::Combat => 0.7,
            GoalCategory::Crafting => 0.65,
            GoalCategory::Work => 0.6,
            GoalCategory::Logistics => 0.55,
            GoalCategory::Social => 0.45,
            GoalCategory::Explore => 0.3,
            GoalCategory::Inspect => 0.25,
        }
    }
}

pub struct PriorityManager;

impl PriorityManager {
    /// `(agent, domain, basePriority) -> adjusted priority`.
    pub fn adjust(&self, category: GoalCategory, base_priority: f32, ctx: &GoalContext, role: Option<Role>) -> f32 {
        let mut weight = category.base_weight();

        if ctx.global_water_scarce || ctx.global_food_scarce {
            if category == GoalCategory::Survival {
                weight *= 1.3;
            }
            if category == GoalCategory::Logistics {
                weight *= 1.2;
            }
        }
        if ctx.global_wood_scarce || ctx.global_stone_scarce {
            if category == GoalCategory::Work || category == GoalCategory::Logistics {
                weight *= 1.15;
            }
        }

        let is_warrior = role.map(Role::is_warrior).unwrap_or(false);
        if is_warrior {
            if category == GoalCategory::Combat {
                weight *= 1.25;
            }
            if category == GoalCategory::Crafting {
                weight *= 1.15;
            }
            if category == GoalCategory::Flee {
                weight = 0.0;
            }
        } else {
            if category == GoalCategory::Flee {
                weight *= 1.2;
            }
            if category == GoalCategory::Combat {
                weight *= 0.8;
            }
        }

        base_priority * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warrior_suppresses_flee() {
        let mgr = PriorityManager;
        let ctx = GoalContext::default();
        let adjusted = mgr.adjust(GoalCategory::Flee, 0.9, &ctx, Some(Role::Guard));
        assert_eq!(adjusted, 0.0);
    }

    #[test]
    fn scarcity_boosts_survival() {
        let mgr = PriorityManager;
        let mut ctx = GoalContext::default();
        ctx.global_food_scarce = true;
        let normal = mgr.adjust(GoalCategory::Survival, 0.5, &GoalContext::default(), Some(Role::Idle));
        let boosted = mgr.adjust(GoalCategory::Survival, 0.5, &ctx, Some(Role::Idle));
        assert!(boosted > normal);
    }
}
