//! Global market state: scarcity-indexed prices and per-pair trade
//! cooldowns (`spec.md` §4.7 "Pricing" and "Auto-trade").

use crate::ids::AgentId;
use crate::world::inventory::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Market {
    pub prices: HashMap<ResourceKind, u32>,
    /// (seller, buyer, kind) -> tick the cooldown expires.
    #[serde(skip)]
    pub trade_cooldowns: HashMap<(AgentId, AgentId, ResourceKind), u64>,
}

impl Market {
    pub fn price_of(&self, kind: ResourceKind) -> u32 {
        *self.prices.get(&kind).unwrap_or(&kind.base_price())
    }

    pub fn set_price(&mut self, kind: ResourceKind, price: u32) {
        self.prices.insert(kind, price.max(1));
    }

    pub fn is_on_cooldown(&self, seller: AgentId, buyer: AgentId, kind: ResourceKind, now: u64) -> bool {
        self.trade_cooldowns
            .get(&(seller, buyer, kind))
            .map(|expiry| *expiry > now)
            .unwrap_or(false)
    }

    pub fn set_cooldown(&mut self, seller: AgentId, buyer: AgentId, kind: ResourceKind, expires_at: u64) {
        self.trade_cooldowns.insert((seller, buyer, kind), expires_at);
    }
}
