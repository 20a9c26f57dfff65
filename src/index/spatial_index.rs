//! Uniform-grid spatial index (`spec.md` §4.3 "SpatialIndex"). Chunks
//! entities into `cell_size`-wide buckets, matching the teacher's
//! `SpatialEntityIndex` chunking strategy but generalized over agents,
//! animals, and world resources via `SpatialId` instead of one bespoke
//! index per entity kind.

use crate::ids::{AgentId, AnimalId, ResourceId};
use glam::{IVec2, Vec2};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialId {
    Agent(AgentId),
    Animal(AnimalId),
    Resource(ResourceId),
}

impl SpatialId {
    pub fn as_agent(self) -> Option<AgentId> {
        match self {
            SpatialId::Agent(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_resource(self) -> Option<ResourceId> {
        match self {
            SpatialId::Resource(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_animal(self) -> Option<AnimalId> {
        match self {
            SpatialId::Animal(id) => Some(id),
            _ => None,
        }
    }
}

/// Uniform grid keyed by chunk coordinate. Handles 10⁴+ entities with
/// sub-millisecond median `queryRadius` by only scanning chunks that
/// intersect the query circle's bounding box (`spec.md` §4.3).
pub struct SpatialIndex {
    cell_size: f32,
    chunks: HashMap<IVec2, Vec<(SpatialId, Vec2)>>,
    positions: HashMap<SpatialId, Vec2>,
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            chunks: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    fn chunk_of(&self, p: Vec2) -> IVec2 {
        IVec2::new((p.x / self.cell_size).floor() as i32, (p.y / self.cell_size).floor() as i32)
    }

    fn insert(&mut self, id: SpatialId, position: Vec2) {
        self.remove(id);
        let chunk = self.chunk_of(position);
        self.chunks.entry(chunk).or_default().push((id, position));
        self.positions.insert(id, position);
    }

    fn remove(&mut self, id: SpatialId) {
        if let Some(old_pos) = self.positions.remove(&id) {
            let chunk = self.chunk_of(old_pos);
            if let Some(bucket) = self.chunks.get_mut(&chunk) {
                bucket.retain(|(existing, _)| *existing != id);
                if bucket.is_empty() {
                    self.chunks.remove(&chunk);
                }
            }
        }
    }

    pub fn insert_agent(&mut self, id: AgentId, position: Vec2) {
        self.insert(SpatialId::Agent(id), position);
    }

    pub fn remove_agent(&mut self, id: AgentId) {
        self.remove(SpatialId::Agent(id));
    }

    pub fn insert_animal(&mut self, id: AnimalId, position: Vec2) {
        self.insert(SpatialId::Animal(id), position);
    }

    pub fn remove_animal(&mut self, id: AnimalId) {
        self.remove(SpatialId::Animal(id));
    }

    pub fn insert_resource(&mut self, id: ResourceId, position: Vec2) {
        self.insert(SpatialId::Resource(id), position);
    }

    pub fn remove_resource(&mut self, id: ResourceId) {
        self.remove(SpatialId::Resource(id));
    }

    pub fn update_position(&mut self, id: SpatialId, position: Vec2) {
        self.insert(id, position);
    }

    /// Returns `(id, dist_squared)` for every entry within `radius` of
    /// `center` that passes `filter`, unordered.
    pub fn query_radius(
        &self,
        center: Vec2,
        radius: f32,
        filter: impl Fn(SpatialId) -> bool,
    ) -> Vec<(SpatialId, f32)> {
        let radius_sq = radius * radius;
        let min_chunk = self.chunk_of(center - Vec2::splat(radius));
        let max_chunk = self.chunk_of(center + Vec2::splat(radius));
        let mut out = Vec::new();
        for cy in min_chunk.y..=max_chunk.y {
            for cx in min_chunk.x..=max_chunk.x {
                let Some(bucket) = self.chunks.get(&IVec2::new(cx, cy)) else {
                    continue;
                };
                for &(id, pos) in bucket {
                    if !filter(id) {
                        continue;
                    }
                    let dist_sq = center.distance_squared(pos);
                    if dist_sq <= radius_sq {
                        out.push((id, dist_sq));
                    }
                }
            }
        }
        out
    }

    /// Nearest entry to `center` passing `filter`, expanding the search
    /// ring outward until one is found or `max_radius` is exhausted.
    pub fn find_nearest(
        &self,
        center: Vec2,
        max_radius: f32,
        filter: impl Fn(SpatialId) -> bool,
    ) -> Option<(SpatialId, f32)> {
        let mut radius = self.cell_size;
        while radius <= max_radius {
            let hits = self.query_radius(center, radius, &filter);
            if let Some(nearest) = hits.into_iter().min_by(|a, b| a.1.total_cmp(&b.1)) {
                return Some(nearest);
            }
            radius *= 2.0;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_radius_finds_nearby_only() {
        let mut index = SpatialIndex::new(16.0);
        let a = AgentId::from_raw(1);
        let b = AgentId::from_raw(2);
        index.insert_agent(a, Vec2::new(0.0, 0.0));
        index.insert_agent(b, Vec2::new(500.0, 500.0));
        let hits = index.query_radius(Vec2::ZERO, 20.0, |_| true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, SpatialId::Agent(a));
    }

    #[test]
    fn moved_entity_is_found_at_new_chunk() {
        let mut index = SpatialIndex::new(16.0);
        let a = AgentId::from_raw(1);
        index.insert_agent(a, Vec2::new(0.0, 0.0));
        index.insert_agent(a, Vec2::new(200.0, 200.0));
        let hits = index.query_radius(Vec2::new(200.0, 200.0), 5.0, |_| true);
        assert_eq!(hits.len(), 1);
        let miss = index.query_radius(Vec2::ZERO, 5.0, |_| true);
        assert!(miss.is_empty());
    }

    #[test]
    fn find_nearest_returns_closest() {
        let mut index = SpatialIndex::new(16.0);
        let near = AgentId::from_raw(1);
        let far = AgentId::from_raw(2);
        index.insert_agent(near, Vec2::new(10.0, 0.0));
        index.insert_agent(far, Vec2::new(100.0, 0.0));
        let (id, _) = index.find_nearest(Vec2::ZERO, 500.0, |_| true).unwrap();
        assert_eq!(id, SpatialId::Agent(near));
    }
}
