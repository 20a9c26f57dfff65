//! Maps a chosen `Goal` to a `PrimitiveAction` via a declarative table,
//! with a few bespoke handlers for goals needing multi-step search
//! (`spec.md` §4.9 step 4).

use crate::ai::context::GoalContext;
use crate::world::agent::{Goal, GoalTarget, GoalType, PrimitiveAction};
use glam::Vec2;

#[derive(Debug, Clone, Copy)]
pub enum ActionRule {
    /// Execute `action` if within `range` of the target, else move there.
    Range { range: f32, action: PrimitiveAction },
    /// Execute `action` if inside the target zone, else move to it.
    Zone { action: PrimitiveAction },
    /// Always returns `action` directly, no positional check.
    Simple { action: PrimitiveAction },
    /// Always moves toward the target.
    Move,
}

fn table_for(goal_type: GoalType) -> ActionRule {
    match goal_type {
        GoalType::SatisfyHunger | GoalType::SatisfyThirst => ActionRule::Range { range: 20.0, action: PrimitiveAction::Harvest },
        GoalType::Rest => ActionRule::Simple { action: PrimitiveAction::Sleep },
        GoalType::Socialize => ActionRule::Range { range: 5.0, action: PrimitiveAction::Socialize },
        GoalType::Work => ActionRule::Zone { action: PrimitiveAction::Craft },
        GoalType::Deposit => ActionRule::Zone { action: PrimitiveAction::Deposit },
        GoalType::Craft => ActionRule::Zone { action: PrimitiveAction::Craft },
        GoalType::Hunt => ActionRule::Range { range: 3.0, action: PrimitiveAction::Attack },
        GoalType::Explore => ActionRule::Move,
        GoalType::Flee => ActionRule::Move,
        GoalType::Attack => ActionRule::Range { range: 3.0, action: PrimitiveAction::Attack },
        GoalType::Mate => ActionRule::Range { range: 5.0, action: PrimitiveAction::Mate },
        GoalType::Idle => ActionRule::Simple { action: PrimitiveAction::Idle },
    }
}

pub struct ActionPlanner;

impl ActionPlanner {
    /// Resolves a goal into the primitive action to run this tick.
    /// `target_pos` is `None` when the goal's target has no fixed
    /// position (e.g. `GoalTarget::None`), in which case range/zone
    /// checks pass trivially.
    pub fn plan(&self, goal: &Goal, ctx: &GoalContext, target_pos: Option<Vec2>, in_target_zone: bool) -> PrimitiveAction {
        match goal.goal_type {
            GoalType::Hunt => return self.plan_hunt(ctx, target_pos),
            GoalType::Explore => return self.plan_explore(ctx),
            GoalType::Work => return self.plan_work(ctx, in_target_zone),
            _ => {}
        }

        match table_for(goal.goal_type) {
            ActionRule::Range { range, action } => match target_pos {
                Some(pos) if ctx.position.distance(pos) <= range => action,
                Some(_) => PrimitiveAction::Move,
                None => action,
            },
            ActionRule::Zone { action } => {
                if in_target_zone {
                    action
                } else {
                    PrimitiveAction::Move
                }
            }
            ActionRule::Simple { action } => action,
            ActionRule::Move => PrimitiveAction::Move,
        }
    }

    /// Hunting requires closing distance on a moving target; falls back
    /// to `Move` until within attack range, matching `Range` semantics
    /// but kept bespoke because a future revision may add line-of-sight.
    fn plan_hunt(&self, ctx: &GoalContext, target_pos: Option<Vec2>) -> PrimitiveAction {
        match target_pos {
            Some(pos) if ctx.position.distance(pos) <= 3.0 => PrimitiveAction::Attack,
            Some(_) => PrimitiveAction::Move,
            None => PrimitiveAction::Idle,
        }
    }

    /// Exploration has no fixed target until one is picked; the caller
    /// (movement system) generates a random reachable point when it sees
    /// `Move` with `GoalTarget::None` on an explore goal.
    fn plan_explore(&self, _ctx: &GoalContext) -> PrimitiveAction {
        PrimitiveAction::Move
    }

    fn plan_work(&self, _ctx: &GoalContext, in_target_zone: bool) -> PrimitiveAction {
        if in_target_zone {
            PrimitiveAction::Craft
        } else {
            PrimitiveAction::Move
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::agent::GoalTarget;
    use std::collections::HashMap;

    fn goal(goal_type: GoalType) -> Goal {
        Goal { goal_type, target: GoalTarget::None, priority: 0.5, created_at_tick: 0, params: HashMap::new() }
    }

    #[test]
    fn range_goal_moves_when_far() {
        let planner = ActionPlanner;
        let ctx = GoalContext { position: Vec2::ZERO, ..Default::default() };
        let action = planner.plan(&goal(GoalType::SatisfyHunger), &ctx, Some(Vec2::new(100.0, 0.0)), false);
        assert_eq!(action, PrimitiveAction::Move);
    }

    #[test]
    fn range_goal_harvests_when_close() {
        let planner = ActionPlanner;
        let ctx = GoalContext { position: Vec2::ZERO, ..Default::default() };
        let action = planner.plan(&goal(GoalType::SatisfyHunger), &ctx, Some(Vec2::new(5.0, 0.0)), false);
        assert_eq!(action, PrimitiveAction::Harvest);
    }
}
