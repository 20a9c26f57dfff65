//! Inbound command stream (`spec.md` §6 "External interfaces"). One
//! bounded, ordered queue; `enqueue` returns `false` on overflow rather
//! than blocking or erroring, mirroring the teacher's command-channel
//! backpressure handling in `src/simulation/commands.rs`.

use crate::ids::{AgentId, ResourceId, ZoneId};
use crate::systems::time_of_day::Weather;
use crate::world::agent::{GoalTarget, GoalType};
use crate::world::inventory::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NeedsCommand {
    SatisfyNeed { agent: AgentId, need: crate::ai::context::NeedKind, amount: f32 },
    ModifyNeed { agent: AgentId, need: crate::ai::context::NeedKind, delta: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SocialCommand {
    ImposeTruce { a: AgentId, b: AgentId },
    SetAffinity { a: AgentId, b: AgentId, value: f32 },
    ModifyAffinity { a: AgentId, b: AgentId, delta: f32 },
    FriendlyInteraction { a: AgentId, b: AgentId },
    HostileEncounter { a: AgentId, b: AgentId },
    RemoveRelationship { a: AgentId, b: AgentId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentOverride {
    MoveTo { target: GoalTarget },
    SetActivity { goal: GoalType },
}

/// Building/task commands are accepted into the recognised command set for
/// protocol completeness, but have no backing system in this core — role
/// assignment, crafting, and production zones are the only construction-
/// adjacent systems in scope (`spec.md` §2 "Supporting systems"). Applying
/// one is a logged no-op; see `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BuildingCommand {
    StartUpgrade { zone: ZoneId },
    CancelUpgrade { zone: ZoneId },
    EnqueueConstruction { zone: ZoneId },
    ConstructBuilding { zone: ZoneId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskCommand {
    CreateTask { description: String },
    ContributeToTask { task_id: u64, agent: AgentId },
    RemoveTask { task_id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeCommand {
    SetWeather { weather: Weather },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    SetTimeScale { multiplier: f64 },
    ApplyResourceDelta { kind: ResourceKind, delta: i64 },
    GatherResource { resource: ResourceId, amount: u32 },
    GiveResource { agent: AgentId, kind: ResourceKind, amount: u32 },
    SpawnAgent { profile: Option<crate::world::AgentProfile> },
    KillAgent { agent: AgentId },
    AgentCommand { agent: AgentId, payload: AgentOverride },
    NeedsCommand(NeedsCommand),
    SocialCommand(SocialCommand),
    BuildingCommand(BuildingCommand),
    TaskCommand(TaskCommand),
    TimeCommand(TimeCommand),
    SaveGame { timestamp: i64 },
}

/// Bounded FIFO command queue. `enqueue` never blocks: it drops the
/// command and returns `false` once `capacity` is reached, per `spec.md`
/// §6 ("enqueueCommand returns false on overflow").
pub struct CommandQueue {
    queue: VecDeque<Command>,
    capacity: usize,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        Self { queue: VecDeque::with_capacity(capacity.min(4096)), capacity }
    }

    pub fn enqueue(&mut self, command: Command) -> bool {
        if self.queue.len() >= self.capacity {
            return false;
        }
        self.queue.push_back(command);
        true
    }

    /// Drains up to `max` commands in FIFO order.
    pub fn drain(&mut self, max: usize) -> Vec<Command> {
        let n = max.min(self.queue.len());
        self.queue.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_fails_past_capacity() {
        let mut q = CommandQueue::new(1);
        assert!(q.enqueue(Command::SetTimeScale { multiplier: 1.0 }));
        assert!(!q.enqueue(Command::SetTimeScale { multiplier: 2.0 }));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn drain_is_fifo_and_bounded() {
        let mut q = CommandQueue::new(10);
        for i in 0..5 {
            q.enqueue(Command::KillAgent { agent: AgentId::from_raw(i) });
        }
        let drained = q.drain(3);
        assert_eq!(drained.len(), 3);
        assert_eq!(q.len(), 2);
        if let Command::KillAgent { agent } = drained[0] {
            assert_eq!(agent, AgentId::from_raw(0));
        } else {
            panic!("wrong variant");
        }
    }
}
