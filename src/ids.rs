//! Opaque, stable entity identifiers.
//!
//! IDs are never reused within a run. Every cross-system reference in this
//! crate goes through one of these newtypes rather than a `bevy_ecs::Entity`
//! or a raw pointer, so systems can hold a stable handle across ticks even
//! after the underlying ECS entity is despawned and recreated (see
//! respawn semantics in `spec.md` §9).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

id_type!(AgentId);
id_type!(AnimalId);
id_type!(ResourceId);
id_type!(ZoneId);

/// Monotonic id allocator. One instance lives on `WorldState` per id kind;
/// ids are never reused, even across agent death and respawn (the
/// respawned agent keeps its original id per the fixed respawn contract).
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
