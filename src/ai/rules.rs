//! Declarative goal rule table (`spec.md` §4.9 step 3). Evaluation order
//! is this slice's order; ties in priority break by rule id
//! lexicographically (enforced by the planner, not here).

use crate::ai::context::{GoalContext, NeedKind};
use crate::ai::priority::GoalCategory;
use crate::world::agent::{GoalTarget, GoalType};

/// Mirrors `NeedsSystem`'s `calculatePriority` curve (`spec.md` §4.5):
/// survival needs use the steep curve, social-family needs the gentler
/// one. `critical` is `NeedsConfig.critical_threshold`, threaded through
/// rather than duplicated as a literal; the 30.0 mid-tier breakpoint has
/// no corresponding config knob and stays a literal.
pub fn calculate_priority(value: f32, social_family: bool, critical: f32) -> f32 {
    if social_family {
        if value < critical {
            0.6
        } else if value < 30.0 {
            0.4
        } else {
            0.0
        }
    } else if value < critical {
        0.95
    } else if value < 30.0 {
        0.8
    } else {
        0.6
    }
}

pub struct GoalRule {
    pub id: &'static str,
    pub goal_type: GoalType,
    pub category: GoalCategory,
    pub condition: fn(&GoalContext) -> bool,
    pub priority: fn(&GoalContext) -> f32,
    pub min_priority: Option<f32>,
    pub target: fn(&GoalContext) -> GoalTarget,
    pub is_critical: bool,
}

fn nearest_resource_target(ctx: &GoalContext, pick: impl Fn(&GoalContext) -> Option<(crate::ids::ResourceId, glam::Vec2)>) -> GoalTarget {
    pick(ctx).map(|(id, _)| GoalTarget::Resource(id)).unwrap_or(GoalTarget::None)
}

fn hunger_priority(ctx: &GoalContext) -> f32 {
    calculate_priority(ctx.need(NeedKind::Hunger), false, ctx.critical_threshold)
}

fn thirst_priority(ctx: &GoalContext) -> f32 {
    calculate_priority(ctx.need(NeedKind::Thirst), false, ctx.critical_threshold)
}

fn rest_priority(ctx: &GoalContext) -> f32 {
    calculate_priority(ctx.need(NeedKind::Energy), false, ctx.critical_threshold)
}

fn social_priority(ctx: &GoalContext) -> f32 {
    let social = calculate_priority(ctx.need(NeedKind::Social), true, ctx.critical_threshold);
    let fun = calculate_priority(ctx.need(NeedKind::Fun), true, ctx.critical_threshold);
    let mental = calculate_priority(ctx.need(NeedKind::MentalHealth), true, ctx.critical_threshold);
    social.max(fun).max(mental)
}

/// The fixed rule list evaluated every decision interval. Order matters
/// only as a tiebreak fallback; priority comparison is the primary sort.
pub fn default_rules() -> Vec<GoalRule> {
    vec![
        GoalRule {
            id: "flee_predator",
            goal_type: GoalType::Flee,
            category: GoalCategory::Flee,
            condition: |ctx| ctx.nearby_predators || ctx.has_enemies,
            priority: |_| 0.95,
            min_priority: None,
            target: |ctx| ctx.nearest_enemy.map(|(id, _)| GoalTarget::Agent(id)).unwrap_or(GoalTarget::None),
            is_critical: true,
        },
        GoalRule {
            id: "satisfy_hunger",
            goal_type: GoalType::SatisfyHunger,
            category: GoalCategory::Survival,
            condition: |ctx| ctx.need(NeedKind::Hunger) < 50.0,
            priority: hunger_priority,
            min_priority: Some(0.1),
            target: |ctx| nearest_resource_target(ctx, |c| c.nearest_food),
            is_critical: true,
        },
        GoalRule {
            id: "satisfy_thirst",
            goal_type: GoalType::SatisfyThirst,
            category: GoalCategory::Survival,
            condition: |ctx| ctx.need(NeedKind::Thirst) < 50.0,
            priority: thirst_priority,
            min_priority: Some(0.1),
            target: |ctx| nearest_resource_target(ctx, |c| c.nearest_water),
            is_critical: true,
        },
        GoalRule {
            id: "rest",
            goal_type: GoalType::Rest,
            category: GoalCategory::Rest,
            condition: |ctx| ctx.need(NeedKind::Energy) < 50.0,
            priority: rest_priority,
            min_priority: Some(0.1),
            target: |_| GoalTarget::None,
            is_critical: false,
        },
        GoalRule {
            id: "attack_enemy",
            goal_type: GoalType::Attack,
            category: GoalCategory::Combat,
            condition: |ctx| ctx.is_in_combat,
            priority: |_| 0.85,
            min_priority: None,
            target: |ctx| ctx.nearest_enemy.map(|(id, _)| GoalTarget::Agent(id)).unwrap_or(GoalTarget::None),
            is_critical: false,
        },
        GoalRule {
            id: "deposit_excess",
            goal_type: GoalType::Deposit,
            category: GoalCategory::Logistics,
            condition: |ctx| ctx.has_excess_resources && ctx.deposit_zone_id.is_some(),
            priority: |_| 0.55,
            min_priority: None,
            target: |ctx| ctx.deposit_zone_id.map(GoalTarget::Zone).unwrap_or(GoalTarget::None),
            is_critical: false,
        },
        GoalRule {
            id: "craft_at_zone",
            goal_type: GoalType::Craft,
            category: GoalCategory::Crafting,
            condition: |ctx| ctx.craft_zone_id.is_some(),
            priority: |_| 0.5,
            min_priority: None,
            target: |ctx| ctx.craft_zone_id.map(GoalTarget::Zone).unwrap_or(GoalTarget::None),
            is_critical: false,
        },
        GoalRule {
            id: "work_role",
            goal_type: GoalType::Work,
            category: GoalCategory::Work,
            condition: |ctx| ctx.role.is_some(),
            priority: |_| 0.45,
            min_priority: None,
            target: |_| GoalTarget::None,
            is_critical: false,
        },
        GoalRule {
            id: "socialize",
            goal_type: GoalType::Socialize,
            category: GoalCategory::Social,
            condition: |ctx| social_priority(ctx) > 0.0 && ctx.nearest_agent.is_some(),
            priority: social_priority,
            min_priority: Some(0.05),
            target: |ctx| ctx.nearest_agent.map(|(id, _)| GoalTarget::Agent(id)).unwrap_or(GoalTarget::None),
            is_critical: false,
        },
        GoalRule {
            id: "explore",
            goal_type: GoalType::Explore,
            category: GoalCategory::Explore,
            condition: |_| true,
            priority: |_| 0.2,
            min_priority: None,
            target: |_| GoalTarget::None,
            is_critical: false,
        },
        GoalRule {
            id: "idle",
            goal_type: GoalType::Idle,
            category: GoalCategory::Inspect,
            condition: |_| true,
            priority: |_| 0.05,
            min_priority: None,
            target: |_| GoalTarget::None,
            is_critical: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_curve_matches_spec_breakpoints() {
        assert_eq!(calculate_priority(10.0, false, 15.0), 0.95);
        assert_eq!(calculate_priority(25.0, false, 15.0), 0.8);
        assert_eq!(calculate_priority(60.0, false, 15.0), 0.6);
        assert_eq!(calculate_priority(10.0, true, 15.0), 0.6);
        assert_eq!(calculate_priority(25.0, true, 15.0), 0.4);
    }

    #[test]
    fn default_rules_always_include_a_fallback() {
        let rules = default_rules();
        assert!(rules.iter().any(|r| r.id == "idle"));
    }
}
