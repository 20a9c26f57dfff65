//! Per-agent movement state machine and path request coupling
//! (`spec.md` §4.6 "MovementSystem + Pathfinder").

use crate::config::MovementConfig;
use crate::events::{EventLog, SimEvent};
use crate::ids::AgentId;
use crate::pathfinding::PathfindingPool;
use crate::world::terrain::TerrainGrid;
use crate::world::WorldState;
use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum MovementState {
    Idle,
    ComputingPath { to: Vec2 },
    FollowingPath { waypoints: Vec<IVec2>, index: usize },
    Arrived { zone: Option<crate::ids::ZoneId> },
}

impl Default for MovementState {
    fn default() -> Self {
        MovementState::Idle
    }
}

#[derive(Component, Debug, Default)]
pub struct MovementIntent {
    pub state: MovementState,
}

const MOVE_SPEED_PER_TICK: f32 = 3.0;

pub struct MovementSystem {
    pool: PathfindingPool,
}

impl MovementSystem {
    pub fn new(pool_size: usize) -> Self {
        Self { pool: PathfindingPool::new(pool_size) }
    }

    /// Starts (or restarts) pathfinding toward `to` for `agent`, taking
    /// ownership of its action until arrival or failure (`spec.md` §4.6
    /// "Action coupling").
    pub fn request_move(&mut self, world: &mut WorldState, terrain: &Arc<TerrainGrid>, agent: AgentId, to: Vec2, cfg: &MovementConfig) {
        let Some(entity) = world.agent_entity(agent) else {
            return;
        };
        let from = world.get_agent(agent).map(|a| a.position).unwrap_or(to);
        if from.distance(to) <= 1.0 {
            if let Some(mut intent) = world.ecs.get_mut::<MovementIntent>(entity) {
                intent.state = MovementState::Arrived { zone: world.zone_at(to).map(|z| z.id) };
            }
            return;
        }

        let from_tile = IVec2::new(from.x as i32, from.y as i32);
        let to_tile = IVec2::new(to.x as i32, to.y as i32);
        if from_tile.as_vec2().distance(to_tile.as_vec2()) <= cfg.max_pathfinding_distance as f32 {
            self.pool.submit(agent, from_tile, to_tile, Arc::clone(terrain), cfg.max_expanded_nodes);
            if let Some(mut intent) = world.ecs.get_mut::<MovementIntent>(entity) {
                intent.state = MovementState::ComputingPath { to };
            }
        } else {
            // Hierarchical/straight-line fallback for distant targets
            // (`spec.md` §4.6): walk the straight segment tile-by-tile.
            let waypoints = vec![from_tile, to_tile];
            if let Some(mut intent) = world.ecs.get_mut::<MovementIntent>(entity) {
                intent.state = MovementState::FollowingPath { waypoints, index: 0 };
            }
        }
    }

    pub fn cancel(&mut self, agent: AgentId) {
        self.pool.cancel_owner(agent);
    }

    /// Drains resolved path computations and starts following them; call
    /// once per tick.
    pub fn poll_paths(&mut self, world: &mut WorldState, events: &mut EventLog) {
        for result in self.pool.poll_results() {
            let Some(entity) = world.agent_entity(result.owner) else {
                continue;
            };
            let Some(mut intent) = world.ecs.get_mut::<MovementIntent>(entity) else {
                continue;
            };
            match result.path {
                Some(waypoints) => intent.state = MovementState::FollowingPath { waypoints, index: 0 },
                None => {
                    intent.state = MovementState::Idle;
                    events.push(SimEvent::PathBlocked { agent: result.owner });
                }
            }
        }
    }

    /// Advances every agent currently following a path by one step.
    pub fn step(&mut self, world: &mut WorldState, events: &mut EventLog) {
        let agent_ids = world.living_agent_ids();
        for id in agent_ids {
            self.step_agent(world, id, events);
        }
    }

    fn step_agent(&mut self, world: &mut WorldState, id: AgentId, events: &mut EventLog) {
        let Some(entity) = world.agent_entity(id) else {
            return;
        };
        let next_target = {
            let Some(intent) = world.ecs.get::<MovementIntent>(entity) else {
                return;
            };
            match &intent.state {
                MovementState::FollowingPath { waypoints, index } => waypoints.get(*index).copied(),
                _ => None,
            }
        };
        let Some(target_tile) = next_target else {
            return;
        };
        let target = Vec2::new(target_tile.x as f32 + 0.5, target_tile.y as f32 + 0.5);

        let position = world.get_agent(id).map(|a| a.position).unwrap_or(target);
        let to_target = target - position;
        let arrived_this_step = to_target.length() <= MOVE_SPEED_PER_TICK;
        let step = if arrived_this_step { to_target } else { to_target.normalize_or_zero() * MOVE_SPEED_PER_TICK };
        let new_position = position + step;

        if let Some(mut agent) = world.get_agent_mut(id) {
            agent.position = new_position;
            agent.velocity = step;
        }
        world.entity_index.update_position(id, new_position);
        world.spatial_index.insert_agent(id, new_position);

        if arrived_this_step {
            let advance = {
                let mut intent = world.ecs.get_mut::<MovementIntent>(entity).unwrap();
                if let MovementState::FollowingPath { waypoints, index } = &mut intent.state {
                    *index += 1;
                    if *index >= waypoints.len() {
                        let zone = world.zone_at(new_position).map(|z| z.id);
                        intent.state = MovementState::Arrived { zone };
                        Some(())
                    } else {
                        None
                    }
                } else {
                    None
                }
            };
            if advance.is_some() {
                events.push(SimEvent::Arrived { agent: id });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::agent::Role;
    use crate::world::terrain::TileType;
    use crate::world::AgentProfile;

    #[test]
    fn request_move_to_adjacent_target_follows_straight_path() {
        let mut world = WorldState::new(TerrainGrid::new_flat(32, 32, TileType::Grass));
        let terrain = Arc::new(TerrainGrid::new_flat(32, 32, TileType::Grass));
        let id = world.add_agent(AgentProfile { position: Some(Vec2::new(2.0, 2.0)), role: Some(Role::Idle) });
        let entity = world.agent_entity(id).unwrap();

        let mut system = MovementSystem::new(2);
        let cfg = MovementConfig::default();
        system.request_move(&mut world, &terrain, id, Vec2::new(10.0, 2.0), &cfg);

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        let mut events = EventLog::default();
        loop {
            system.poll_paths(&mut world, &mut events);
            let state = world.ecs.get::<MovementIntent>(entity).unwrap().state.clone();
            if !matches!(state, MovementState::ComputingPath { .. }) {
                break;
            }
            if std::time::Instant::now() > deadline {
                panic!("path never resolved");
            }
        }
        let state = world.ecs.get::<MovementIntent>(entity).unwrap().state.clone();
        assert!(matches!(state, MovementState::FollowingPath { .. }));
    }
}
