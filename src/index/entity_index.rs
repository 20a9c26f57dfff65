//! O(1) id→entity lookup plus a dense positions buffer parallel to the
//! agent id list (`spec.md` §4.3 "EntityIndex").

use crate::ids::AgentId;
use bevy_ecs::entity::Entity;
use glam::Vec2;
use std::collections::HashMap;

#[derive(Default)]
pub struct EntityIndex {
    agent_entities: HashMap<AgentId, Entity>,
    /// Parallel to `order`: `positions[2*i], positions[2*i+1]` is the
    /// position of `order[i]`.
    order: Vec<AgentId>,
    slot_of: HashMap<AgentId, usize>,
    positions: Vec<f32>,
}

impl EntityIndex {
    pub fn insert_agent(&mut self, id: AgentId, entity: Entity, position: Vec2) {
        self.agent_entities.insert(id, entity);
        if let Some(&slot) = self.slot_of.get(&id) {
            self.positions[slot * 2] = position.x;
            self.positions[slot * 2 + 1] = position.y;
        } else {
            let slot = self.order.len();
            self.order.push(id);
            self.slot_of.insert(id, slot);
            self.positions.push(position.x);
            self.positions.push(position.y);
        }
    }

    /// Updates the dense position buffer for an already-tracked agent.
    /// Called once per tick at step 4 (`spec.md` §4.3).
    pub fn update_position(&mut self, id: AgentId, position: Vec2) {
        if let Some(&slot) = self.slot_of.get(&id) {
            self.positions[slot * 2] = position.x;
            self.positions[slot * 2 + 1] = position.y;
        }
    }

    pub fn agent_entity(&self, id: AgentId) -> Option<Entity> {
        self.agent_entities.get(&id).copied()
    }

    pub fn remove_agent(&mut self, id: AgentId) -> Option<Entity> {
        let entity = self.agent_entities.remove(&id)?;
        if let Some(slot) = self.slot_of.remove(&id) {
            let last = self.order.len() - 1;
            self.order.swap(slot, last);
            self.positions.swap(slot * 2, last * 2);
            self.positions.swap(slot * 2 + 1, last * 2 + 1);
            self.order.pop();
            self.positions.pop();
            self.positions.pop();
            if slot < self.order.len() {
                let moved = self.order[slot];
                self.slot_of.insert(moved, slot);
            }
        }
        Some(entity)
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.order.iter().copied()
    }

    pub fn position_of(&self, id: AgentId) -> Option<Vec2> {
        let slot = *self.slot_of.get(&id)?;
        Some(Vec2::new(self.positions[slot * 2], self.positions[slot * 2 + 1]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Dense positions buffer `[x0,y0,x1,y1,...]`, parallel to `agent_ids()`.
    pub fn positions_buffer(&self) -> &[f32] {
        &self.positions
    }
}
