//! World-placed harvestable resources (`spec.md` §3 "WorldResource").

use crate::ids::ResourceId;
use crate::world::inventory::ResourceKind;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Tree,
    Rock,
    BerryBush,
    WaterSource,
}

impl ResourceType {
    pub fn yields(self) -> ResourceKind {
        match self {
            ResourceType::Tree => ResourceKind::Wood,
            ResourceType::Rock => ResourceKind::Stone,
            ResourceType::BerryBush => ResourceKind::Food,
            ResourceType::WaterSource => ResourceKind::Water,
        }
    }

    pub fn base_yield(self) -> f32 {
        match self {
            ResourceType::Tree => 2.0,
            ResourceType::Rock => 1.5,
            ResourceType::BerryBush => 5.0,
            ResourceType::WaterSource => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    Pristine,
    Depleted,
}

#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct WorldResource {
    pub id: ResourceId,
    pub kind: ResourceType,
    pub position: Vec2,
    pub state: ResourceState,
    pub remaining_yield: f32,
    /// Ticks until a depleted resource regrows; `None` means it stays
    /// depleted until externally replenished.
    pub regrowth_timer: Option<u32>,
}

impl WorldResource {
    pub fn new(id: ResourceId, kind: ResourceType, position: Vec2, initial_yield: f32) -> Self {
        Self {
            id,
            kind,
            position,
            state: ResourceState::Pristine,
            remaining_yield: initial_yield,
            regrowth_timer: None,
        }
    }

    /// Harvests up to `amount` units. Transitions to `Depleted` when the
    /// remaining yield hits zero.
    pub fn harvest(&mut self, amount: f32) -> f32 {
        if self.state == ResourceState::Depleted {
            return 0.0;
        }
        let taken = amount.min(self.remaining_yield);
        self.remaining_yield -= taken;
        if self.remaining_yield <= 0.0 {
            self.remaining_yield = 0.0;
            self.state = ResourceState::Depleted;
            self.regrowth_timer = Some(600);
        }
        taken
    }

    pub fn tick_regrowth(&mut self) {
        if self.state != ResourceState::Depleted {
            return;
        }
        if let Some(timer) = self.regrowth_timer.as_mut() {
            if *timer == 0 {
                self.state = ResourceState::Pristine;
                self.remaining_yield = self.kind.base_yield() * 4.0;
                self.regrowth_timer = None;
            } else {
                *timer -= 1;
            }
        }
    }
}
