//! Per-tick systems. Each module owns one slice of `spec.md` §2/§4 and is
//! invoked in the fixed order from `crate::tick` — no system reaches into
//! another system's private state; they communicate through `WorldState`
//! and the shared `EventLog`.

pub mod animals;
pub mod combat;
pub mod crafting;
pub mod economy;
pub mod inventory;
pub mod lifecycle;
pub mod movement;
pub mod needs;
pub mod roles;
pub mod social;
pub mod time_of_day;
