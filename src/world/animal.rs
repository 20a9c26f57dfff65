//! Animals (`spec.md` §2 "Supporting systems": "role assignment, crafting,
//! production zones, combat, lifecycle, time-of-day, animals. Specified
//! only at interface level"). Grounded on the teacher's species-specific
//! entities (`entities/types/{wolf,deer,rabbit}.rs`), collapsed here to one
//! data-driven component since full species behavior trees are out of the
//! core's scope — only enough state to drive `GoalContext.nearby_predators`
//! and `queryRadius` filtering survives.

use crate::ids::AnimalId;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalKind {
    Rabbit,
    Deer,
    Wolf,
    Bear,
}

impl AnimalKind {
    pub fn is_predator(self) -> bool {
        matches!(self, AnimalKind::Wolf | AnimalKind::Bear)
    }
}

#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub kind: AnimalKind,
    pub position: Vec2,
    pub health: f32,
    pub is_dead: bool,
}

impl Animal {
    pub fn new(id: AnimalId, kind: AnimalKind, position: Vec2) -> Self {
        Self { id, kind, position, health: 100.0, is_dead: false }
    }
}

#[derive(Component, Debug, Default, Clone, Copy)]
pub struct AnimalMarker;
