//! Per-tick, append-only event buffer (`spec.md` §5 "Ordering
//! guarantees": events are delivered in the order emitted, and all appear
//! in the tick's snapshot before any subsequent tick's events).

use crate::ids::{AgentId, ResourceId, ZoneId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Starvation,
    Dehydration,
    Exhaustion,
    Combat,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SimEvent {
    Arrived { agent: AgentId },
    PathBlocked { agent: AgentId },
    AgentDeath { agent: AgentId, cause: DeathCause },
    AgentRespawned { agent: AgentId },
    ResourceDepleted { resource: ResourceId },
    TradeExecuted { seller: AgentId, buyer: AgentId, kind: crate::world::inventory::ResourceKind, amount: u32 },
    SalaryPaid { agent: AgentId, amount: u32 },
    GroupMerged { agents: Vec<AgentId> },
    ZoneEntered { agent: AgentId, zone: ZoneId },
    SaveRequested { timestamp: i64 },
    Error { message: String },
}

/// Append-only per-tick log. Drained and attached to the snapshot, then
/// cleared before the next tick begins.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn as_slice(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_emission_order() {
        let mut log = EventLog::default();
        log.push(SimEvent::Arrived { agent: AgentId::from_raw(1) });
        log.push(SimEvent::PathBlocked { agent: AgentId::from_raw(2) });
        let drained = log.drain();
        assert!(matches!(drained[0], SimEvent::Arrived { .. }));
        assert!(matches!(drained[1], SimEvent::PathBlocked { .. }));
        assert!(log.as_slice().is_empty());
    }
}
