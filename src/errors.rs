//! Error taxonomy for the simulation core (`spec.md` §7).
//!
//! Four classes matter at the API boundary: validation errors (reported,
//! no mutation), capacity errors (reported, caller retries), transient
//! per-agent failures (logged, that agent idles this tick), and fatal
//! errors (the runner logs and exits). Resource-unavailable conditions
//! (depleted resource, missing ingredients) are *not* errors — they are
//! `ActionOutcome::Failed` results the planner uses to invalidate a goal.

use crate::ids::{AgentId, ResourceId, ZoneId};
use thiserror::Error;

/// Errors surfaced back to a command submitter. Never carries internal
/// details (stack traces, file paths) — see `spec.md` §7 "User-visible
/// behaviour".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),
    #[error("unknown resource {0}")]
    UnknownResource(ResourceId),
    #[error("unknown zone {0}")]
    UnknownZone(ZoneId),
    #[error("malformed command: {0}")]
    MalformedCommand(String),
    #[error("value out of bounds: {0}")]
    OutOfBounds(String),
}

/// Errors caused by a bounded resource being exhausted. The caller may
/// retry; no state was mutated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("command queue is full (capacity {capacity})")]
    CommandQueueFull { capacity: usize },
    #[error("inventory is full for agent {agent} (capacity {capacity})")]
    InventoryFull { agent: AgentId, capacity: u32 },
    #[error("pathfinding queue exceeded its hard bound ({bound})")]
    PathQueueOverflow { bound: usize },
}

/// Unrecoverable condition. The runner logs this and exits the process;
/// no partial tick is ever emitted after one of these.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("world state corrupted: {0}")]
    WorldCorruption(String),
    #[error("unrecoverable persistence I/O during load: {0}")]
    PersistenceLoad(String),
}

/// Top-level error returned by the public command/request API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

pub type SimResult<T> = Result<T, SimError>;
