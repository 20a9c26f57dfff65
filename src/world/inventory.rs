//! Inventory component shared by agents and zone stockpiles (`spec.md`
//! §3 "Inventory" — "Mapping from resource kind to non-negative integer
//! count, plus capacity. One per agent; zone-owned stockpiles share the
//! same shape.").

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Wood,
    Stone,
    Food,
    Water,
    Ore,
    Tool,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Food,
        ResourceKind::Water,
        ResourceKind::Ore,
        ResourceKind::Tool,
    ];

    pub fn base_price(self) -> u32 {
        match self {
            ResourceKind::Wood => 2,
            ResourceKind::Stone => 3,
            ResourceKind::Food => 2,
            ResourceKind::Water => 1,
            ResourceKind::Ore => 5,
            ResourceKind::Tool => 10,
        }
    }
}

#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    counts: HashMap<ResourceKind, u32>,
    pub capacity: u32,
}

impl Inventory {
    pub fn new(capacity: u32) -> Self {
        Self { counts: HashMap::new(), capacity }
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        *self.counts.get(&kind).unwrap_or(&0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty_of(&self, kind: ResourceKind) -> bool {
        self.get(kind) == 0
    }

    /// Adds up to capacity; returns the amount actually added. Never
    /// exceeds capacity (`spec.md` §4.7 "capacity checks happen on add").
    pub fn add(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let room = self.capacity.saturating_sub(self.total());
        let added = amount.min(room);
        if added > 0 {
            *self.counts.entry(kind).or_insert(0) += added;
        }
        added
    }

    /// Removes up to the requested amount; returns the amount actually
    /// removed. Counts never go negative.
    pub fn remove(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let available = self.get(kind);
        let removed = amount.min(available);
        if removed > 0 {
            let entry = self.counts.entry(kind).or_insert(0);
            *entry -= removed;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_respects_capacity() {
        let mut inv = Inventory::new(10);
        assert_eq!(inv.add(ResourceKind::Wood, 6), 6);
        assert_eq!(inv.add(ResourceKind::Stone, 6), 4);
        assert_eq!(inv.total(), 10);
    }

    #[test]
    fn remove_never_goes_negative() {
        let mut inv = Inventory::new(10);
        inv.add(ResourceKind::Food, 3);
        assert_eq!(inv.remove(ResourceKind::Food, 10), 3);
        assert_eq!(inv.get(ResourceKind::Food), 0);
    }

    #[test]
    fn transfer_is_conservative() {
        let mut a = Inventory::new(20);
        let mut b = Inventory::new(20);
        a.add(ResourceKind::Wood, 10);
        let before = a.get(ResourceKind::Wood) + b.get(ResourceKind::Wood);
        let moved = a.remove(ResourceKind::Wood, 4);
        b.add(ResourceKind::Wood, moved);
        let after = a.get(ResourceKind::Wood) + b.get(ResourceKind::Wood);
        assert_eq!(before, after);
    }
}
