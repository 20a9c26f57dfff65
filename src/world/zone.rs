//! Zones: rectangular regions that modify agent interactions inside them
//! (`spec.md` §3 "Zone"). Bounds are immutable after creation.

use crate::ids::ZoneId;
use crate::world::inventory::Inventory;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneType {
    Food,
    Water,
    Rest,
    Shelter,
    Market,
    Work,
    Storage,
    Hygiene,
    Social,
    Fun,
    Mental,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub zone_type: ZoneType,
    pub bounds: Aabb,
    pub capacity: u32,
    pub owner: Option<crate::ids::AgentId>,
    pub access_level: u8,
    pub stockpile: Inventory,
}

impl Zone {
    pub fn new(id: ZoneId, zone_type: ZoneType, bounds: Aabb, capacity: u32) -> Self {
        Self {
            id,
            zone_type,
            bounds,
            capacity,
            owner: None,
            access_level: 0,
            stockpile: Inventory::new(capacity.max(1) * 50),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.bounds.contains(p)
    }
}
