//! Rule evaluation (`spec.md` §4.9 step 3). Deterministic: rule order is
//! fixed by the input slice and priority ties break by rule id.

use crate::ai::context::GoalContext;
use crate::ai::priority::PriorityManager;
use crate::ai::rules::GoalRule;
use crate::world::agent::Goal;

struct Candidate<'a> {
    rule: &'a GoalRule,
    priority: f32,
}

/// Evaluates `rules` against `ctx` and returns the chosen goal, or `None`
/// if nothing matched (the caller falls back to the agent's existing
/// idle behaviour).
pub fn plan_goal(ctx: &GoalContext, rules: &[GoalRule], priority_mgr: &PriorityManager, tick: u64) -> Option<Goal> {
    let role = ctx.role;
    let mut candidates: Vec<Candidate> = Vec::new();

    for rule in rules {
        if !(rule.condition)(ctx) {
            continue;
        }
        let base_priority = (rule.priority)(ctx);
        if let Some(min) = rule.min_priority {
            if base_priority < min {
                continue;
            }
        }
        let adjusted = priority_mgr.adjust(rule.category, base_priority, ctx, role);

        if rule.is_critical && adjusted > 0.9 {
            return Some(make_goal(rule, ctx, adjusted, tick));
        }
        candidates.push(Candidate { rule, priority: adjusted });
    }

    candidates.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.rule.id.cmp(b.rule.id))
    });

    candidates.first().map(|c| make_goal(c.rule, ctx, c.priority, tick))
}

fn make_goal(rule: &GoalRule, ctx: &GoalContext, priority: f32, tick: u64) -> Goal {
    Goal {
        goal_type: rule.goal_type,
        target: (rule.target)(ctx),
        priority,
        created_at_tick: tick,
        params: std::collections::HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::rules::default_rules;

    #[test]
    fn critical_rule_short_circuits() {
        let mut ctx = GoalContext::default();
        ctx.nearby_predators = true;
        let rules = default_rules();
        let mgr = PriorityManager;
        let goal = plan_goal(&ctx, &rules, &mgr, 10).unwrap();
        assert_eq!(goal.goal_type, crate::world::agent::GoalType::Flee);
    }

    #[test]
    fn falls_back_to_idle_when_nothing_else_matches() {
        let ctx = GoalContext::default();
        let rules = default_rules();
        let mgr = PriorityManager;
        let goal = plan_goal(&ctx, &rules, &mgr, 1).unwrap();
        assert!(matches!(
            goal.goal_type,
            crate::world::agent::GoalType::Explore | crate::world::agent::GoalType::Idle
        ));
    }
}
