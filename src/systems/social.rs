//! Weighted relationship graph, incremental group detection, and proximity
//! reinforcement (`spec.md` §4.8 "SocialSystem").

use crate::config::SocialConfig;
use crate::events::{EventLog, SimEvent};
use crate::ids::AgentId;
use crate::world::social::{EdgeKey, SocialEdge};
use crate::world::WorldState;
use std::collections::HashMap;

/// Union-find over agent ids. Crossing the group threshold upward unions
/// two components in O(α(n)); crossing downward only sets a deferred
/// recompute flag, since disentangling a union requires a full rebuild
/// (`spec.md` §4.8 "Affinity mutation").
#[derive(Default)]
struct UnionFind {
    parent: HashMap<AgentId, AgentId>,
}

impl UnionFind {
    fn find(&mut self, id: AgentId) -> AgentId {
        let parent = *self.parent.entry(id).or_insert(id);
        if parent == id {
            return id;
        }
        let root = self.find(parent);
        self.parent.insert(id, root);
        root
    }

    fn union(&mut self, a: AgentId, b: AgentId) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }

    fn reset(&mut self) {
        self.parent.clear();
    }
}

#[derive(Default)]
pub struct SocialSystem {
    groups: UnionFind,
    /// Set when an edge crosses the group threshold downward; cleared by
    /// the next successful deferred recompute.
    dirty: bool,
    last_recompute_tick: u64,
    /// Cursor into the living-agent id list for the staggered proximity
    /// sweep (`spec.md` §4.8 "Proximity update").
    sweep_cursor: usize,
}

impl SocialSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_of(&mut self, agent: AgentId) -> AgentId {
        self.groups.find(agent)
    }

    pub fn same_group(&mut self, a: AgentId, b: AgentId) -> bool {
        self.groups.find(a) == self.groups.find(b)
    }

    /// `modifyAffinity(a,b,δ)` (`spec.md` §4.8 "Affinity mutation").
    pub fn modify_affinity(&mut self, world: &mut WorldState, a: AgentId, b: AgentId, delta: f32, tick: u64, cfg: &SocialConfig, events: &mut EventLog) {
        let key = EdgeKey::new(a, b);
        let before = world.social_graph.get(&key).map(|e| e.affinity).unwrap_or(0.0);
        let edge = world.social_graph.entry(key).or_insert_with(|| SocialEdge::new(0.0, tick));
        edge.modify(delta, tick);
        let after = edge.affinity;

        let crossed_up = before < cfg.group_threshold && after >= cfg.group_threshold;
        let crossed_down = before >= cfg.group_threshold && after < cfg.group_threshold;
        if crossed_up {
            self.groups.union(a, b);
            events.push(SimEvent::GroupMerged { agents: vec![a, b] });
        } else if crossed_down {
            self.dirty = true;
        }
    }

    /// `setAffinity(a,b,v)` — direct set rather than delta, still routed
    /// through the same threshold-crossing logic.
    pub fn set_affinity(&mut self, world: &mut WorldState, a: AgentId, b: AgentId, value: f32, tick: u64, cfg: &SocialConfig, events: &mut EventLog) {
        let key = EdgeKey::new(a, b);
        let before = world.social_graph.get(&key).map(|e| e.affinity).unwrap_or(0.0);
        let delta = value.clamp(-1.0, 1.0) - before;
        self.modify_affinity(world, a, b, delta, tick, cfg, events);
    }

    pub fn remove_relationship(&mut self, world: &mut WorldState, a: AgentId, b: AgentId) {
        world.social_graph.remove(&EdgeKey::new(a, b));
        self.dirty = true;
    }

    /// Staggered proximity reinforcement: processes at most `1/k` of the
    /// living population per tick so a full sweep takes roughly
    /// `full_sweep_seconds` (`spec.md` §4.8).
    pub fn tick_proximity(&mut self, world: &mut WorldState, cfg: &SocialConfig, tick: u64, tick_rate_hz: f64, events: &mut EventLog) {
        let ids = world.living_agent_ids();
        if ids.is_empty() {
            return;
        }
        let total_ticks_per_sweep = (cfg.full_sweep_seconds as f64 * tick_rate_hz).max(1.0);
        let batch = ((ids.len() as f64 / total_ticks_per_sweep).ceil() as usize).max(1);

        for _ in 0..batch {
            if self.sweep_cursor >= ids.len() {
                self.sweep_cursor = 0;
            }
            let Some(&agent) = ids.get(self.sweep_cursor) else {
                break;
            };
            self.sweep_cursor += 1;

            let Some(position) = world.get_agent(agent).map(|a| a.position) else {
                continue;
            };
            let nearby: Vec<AgentId> = world
                .spatial_index
                .query_radius(position, cfg.proximity_radius, |id| id.as_agent().map(|a| a != agent).unwrap_or(false))
                .into_iter()
                .filter_map(|(id, _)| id.as_agent())
                .collect();
            for other in nearby {
                self.modify_affinity(world, agent, other, cfg.proximity_reinforce_delta, tick, cfg, events);
            }
        }
    }

    /// Deferred recompute after a downward threshold crossing: flood-fills
    /// the graph restricted to edges at or above `group_threshold`. Runs
    /// at most once per `deferred_recompute_min_period`.
    pub fn tick_deferred_recompute(&mut self, world: &WorldState, cfg: &SocialConfig, tick: u64, tick_rate_hz: f64) {
        if !self.dirty {
            return;
        }
        let min_period_ticks = (cfg.deferred_recompute_min_period.as_secs_f64() * tick_rate_hz).round() as u64;
        if tick.saturating_sub(self.last_recompute_tick) < min_period_ticks {
            return;
        }
        self.recompute_groups(world, cfg);
        self.last_recompute_tick = tick;
        self.dirty = false;
    }

    fn recompute_groups(&mut self, world: &WorldState, cfg: &SocialConfig) {
        self.groups.reset();
        for (EdgeKey(a, b), edge) in world.social_graph.iter() {
            if edge.affinity >= cfg.group_threshold {
                self.groups.union(*a, *b);
            }
        }
    }

    /// Average positive affinity of nearby agents, for `NeedsSystem`'s
    /// morale bonus (`spec.md` §4.8 "Morale boost"). Returns an empty map
    /// when nobody qualifies. Below `social_accelerator_threshold` this
    /// scans the affinity graph directly in one pass; at or above it,
    /// neighbor lookups go through the spatial index so cost tracks local
    /// density rather than total population squared — this crate has no
    /// real accelerator, so the indexed path stands in for the one
    /// `spec.md` §4.8 names, same stance as `index/batch_query.rs`.
    pub fn compute_morale_bonuses(&self, world: &WorldState, cfg: &SocialConfig) -> HashMap<AgentId, f32> {
        let agent_ids = world.living_agent_ids();
        if agent_ids.len() < cfg.social_accelerator_threshold {
            self.morale_bonuses_pairwise(world, cfg, &agent_ids)
        } else {
            self.morale_bonuses_indexed(world, cfg, &agent_ids)
        }
    }

    fn morale_bonuses_pairwise(&self, world: &WorldState, cfg: &SocialConfig, agent_ids: &[AgentId]) -> HashMap<AgentId, f32> {
        let mut sums: HashMap<AgentId, (f32, u32)> = HashMap::new();
        for (EdgeKey(a, b), edge) in world.social_graph.iter() {
            if edge.affinity <= 0.0 {
                continue;
            }
            let (Some(pos_a), Some(pos_b)) = (world.get_agent(*a).map(|ag| ag.position), world.get_agent(*b).map(|ag| ag.position)) else {
                continue;
            };
            if pos_a.distance(pos_b) > cfg.proximity_radius {
                continue;
            }
            let slot_a = sums.entry(*a).or_insert((0.0, 0));
            slot_a.0 += edge.affinity;
            slot_a.1 += 1;
            let slot_b = sums.entry(*b).or_insert((0.0, 0));
            slot_b.0 += edge.affinity;
            slot_b.1 += 1;
        }
        agent_ids.iter().filter_map(|id| sums.get(id).map(|&(sum, count)| (*id, (sum / count as f32) * 0.5))).collect()
    }

    fn morale_bonuses_indexed(&self, world: &WorldState, cfg: &SocialConfig, agent_ids: &[AgentId]) -> HashMap<AgentId, f32> {
        let mut bonuses = HashMap::new();
        for &agent in agent_ids {
            let Some(position) = world.get_agent(agent).map(|a| a.position) else {
                continue;
            };
            let nearby: Vec<AgentId> = world
                .spatial_index
                .query_radius(position, cfg.proximity_radius, |id| id.as_agent().map(|a| a != agent).unwrap_or(false))
                .into_iter()
                .filter_map(|(id, _)| id.as_agent())
                .collect();
            if nearby.is_empty() {
                continue;
            }
            let mut sum = 0.0;
            let mut count = 0;
            for other in nearby {
                if let Some(edge) = world.social_graph.get(&EdgeKey::new(agent, other)) {
                    if edge.affinity > 0.0 {
                        sum += edge.affinity;
                        count += 1;
                    }
                }
            }
            if count > 0 {
                bonuses.insert(agent, (sum / count as f32) * 0.5);
            }
        }
        bonuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::terrain::TerrainGrid;
    use crate::world::AgentProfile;

    fn make_world() -> WorldState {
        WorldState::new(TerrainGrid::new_flat(32, 32, crate::world::terrain::TileType::Grass))
    }

    #[test]
    fn crossing_threshold_upward_merges_group() {
        let mut world = make_world();
        let a = world.add_agent(AgentProfile::default());
        let b = world.add_agent(AgentProfile::default());
        let cfg = SocialConfig::default();
        let mut system = SocialSystem::new();
        let mut events = EventLog::default();
        system.set_affinity(&mut world, a, b, 0.4, 0, &cfg, &mut events);
        assert!(!system.same_group(a, b));
        system.modify_affinity(&mut world, a, b, 0.2, 1, &cfg, &mut events);
        assert!(system.same_group(a, b));
    }

    #[test]
    fn affinity_is_symmetric_and_clamped() {
        let mut world = make_world();
        let a = world.add_agent(AgentProfile::default());
        let b = world.add_agent(AgentProfile::default());
        let cfg = SocialConfig::default();
        let mut system = SocialSystem::new();
        let mut events = EventLog::default();
        system.modify_affinity(&mut world, a, b, 5.0, 0, &cfg, &mut events);
        let edge = world.social_graph.get(&EdgeKey::new(a, b)).unwrap();
        assert_eq!(edge.affinity, 1.0);
        let edge_reverse = world.social_graph.get(&EdgeKey::new(b, a)).unwrap();
        assert_eq!(edge.affinity, edge_reverse.affinity);
    }

    #[test]
    fn morale_bonus_agrees_below_and_above_the_accelerator_threshold() {
        let mut cfg = SocialConfig::default();
        cfg.social_accelerator_threshold = 3;
        let mut events = EventLog::default();

        let mut small_world = make_world();
        let a = small_world.add_agent(AgentProfile { position: Some(glam::Vec2::new(0.0, 0.0)), role: None });
        let b = small_world.add_agent(AgentProfile { position: Some(glam::Vec2::new(2.0, 0.0)), role: None });
        let mut system = SocialSystem::new();
        system.modify_affinity(&mut small_world, a, b, 0.4, 0, &cfg, &mut events);
        // 2 living agents < threshold 3: pairwise path.
        let below = system.compute_morale_bonuses(&small_world, &cfg);

        cfg.social_accelerator_threshold = 2;
        // 2 living agents >= threshold 2: indexed path.
        let above = system.compute_morale_bonuses(&small_world, &cfg);

        assert_eq!(below.get(&a).copied(), above.get(&a).copied());
        assert_eq!(below.get(&b).copied(), above.get(&b).copied());
    }
}
