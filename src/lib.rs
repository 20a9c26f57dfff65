//! Tick-driven agent simulation core: needs, planning, movement, economy,
//! and social systems over a shared `WorldState` (`spec.md` §1 "Overview").
//! The crate exposes no rendering or transport; callers drive it by
//! enqueuing `Command`s and reading back `Snapshot`s through `TickPipeline`.

pub mod ai;
pub mod commands;
pub mod config;
pub mod errors;
pub mod events;
pub mod ids;
pub mod index;
pub mod pathfinding;
pub mod persistence;
pub mod runner;
pub mod snapshot;
pub mod systems;
pub mod tick;
pub mod world;

pub use commands::{Command, CommandQueue};
pub use config::SimConfig;
pub use errors::{SimError, SimResult};
pub use events::{EventLog, SimEvent};
pub use runner::Runner;
pub use snapshot::Snapshot;
pub use tick::TickPipeline;
pub use world::WorldState;
