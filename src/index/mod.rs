//! Indices that keep lookups over the `WorldState` fast: an id-to-entity
//! directory and a uniform-grid spatial index (`spec.md` §4.3, §4.4).

pub mod batch_query;
pub mod entity_index;
pub mod spatial_index;
