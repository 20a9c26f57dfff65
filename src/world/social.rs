//! Social edge record (`spec.md` §3 "SocialEdge"). Ordered pair (a,b)
//! with a<b; semantically symmetric.

use crate::ids::AgentId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey(pub AgentId, pub AgentId);

impl EdgeKey {
    pub fn new(a: AgentId, b: AgentId) -> Self {
        if a <= b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SocialEdge {
    pub affinity: f32,
    pub last_interaction_tick: u64,
}

impl SocialEdge {
    pub fn new(affinity: f32, tick: u64) -> Self {
        Self { affinity: affinity.clamp(-1.0, 1.0), last_interaction_tick: tick }
    }

    pub fn modify(&mut self, delta: f32, tick: u64) {
        self.affinity = (self.affinity + delta).clamp(-1.0, 1.0);
        self.last_interaction_tick = tick;
    }
}
