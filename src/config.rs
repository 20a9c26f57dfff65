//! Single configuration struct loaded at startup (`spec.md` §6
//! "Configuration"). Environment-derived values enter the simulation only
//! through this struct — no system reads an env var or ambient global
//! directly, mirroring the teacher's `WorldConfig` (`tilemap/mod.rs`)
//! pattern of one config resource constructed once and threaded through.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub clock: ClockConfig,
    pub needs: NeedsConfig,
    pub movement: MovementConfig,
    pub economy: EconomyConfig,
    pub social: SocialConfig,
    pub batch: BatchConfig,
    pub lifecycle: LifecycleConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            needs: NeedsConfig::default(),
            movement: MovementConfig::default(),
            economy: EconomyConfig::default(),
            social: SocialConfig::default(),
            batch: BatchConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse configuration from a TOML document. Unknown fields are
    /// rejected by serde; missing fields fall back to `Default`.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Ticks per second. Default 20 Hz per `spec.md` §4.1.
    pub tick_rate_hz: f64,
    /// Bounded inbound command queue capacity.
    pub command_queue_capacity: usize,
    /// Max commands drained per tick.
    pub max_commands_per_tick: usize,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20.0,
            command_queue_capacity: 1024,
            max_commands_per_tick: 256,
        }
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    /// Units per real-second decay for each of the seven needs.
    pub decay_rate_hunger: f32,
    pub decay_rate_thirst: f32,
    pub decay_rate_energy: f32,
    pub decay_rate_hygiene: f32,
    pub decay_rate_social: f32,
    pub decay_rate_fun: f32,
    pub decay_rate_mental_health: f32,

    pub critical_threshold: f32,
    pub satisfied_threshold: f32,
    pub low_threshold: f32,

    pub update_interval: Duration,
    pub respawn_delay: Duration,
    pub respawn_enabled: bool,

    pub age_multiplier_child: f32,
    pub age_multiplier_adult: f32,
    pub age_multiplier_elder: f32,

    pub energy_action_multiplier_sleep: f32,
    pub energy_action_multiplier_idle: f32,
    pub energy_action_multiplier_work: f32,
    pub energy_action_multiplier_move: f32,

    pub hunger_consume_restore: f32,
    pub thirst_consume_restore: f32,

    pub zone_bonus_hygiene: f32,
    pub zone_bonus_social: f32,
    pub zone_bonus_fun: f32,
    pub zone_bonus_mental: f32,

    /// Needs batch fast path kicks in at or above this many agents.
    pub batch_threshold: usize,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            decay_rate_hunger: 1.0,
            decay_rate_thirst: 1.2,
            decay_rate_energy: 0.8,
            decay_rate_hygiene: 0.5,
            decay_rate_social: 0.4,
            decay_rate_fun: 0.4,
            decay_rate_mental_health: 0.3,

            critical_threshold: 15.0,
            satisfied_threshold: 70.0,
            low_threshold: 50.0,

            update_interval: Duration::from_millis(1000),
            respawn_delay: Duration::from_secs(30),
            respawn_enabled: true,

            age_multiplier_child: 0.7,
            age_multiplier_adult: 1.0,
            age_multiplier_elder: 1.4,

            energy_action_multiplier_sleep: -5.0,
            energy_action_multiplier_idle: -0.5,
            energy_action_multiplier_work: 1.5,
            energy_action_multiplier_move: 2.0,

            hunger_consume_restore: 15.0,
            thirst_consume_restore: 20.0,

            zone_bonus_hygiene: 2.0,
            zone_bonus_social: 2.0,
            zone_bonus_fun: 2.0,
            zone_bonus_mental: 2.0,

            batch_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub max_pathfinding_distance: i32,
    /// Bounded-concurrency pathfinding pool size. Scaled to hardware
    /// parallelism at runtime between `min_concurrent_paths` and
    /// `max_concurrent_paths` unless explicitly overridden.
    pub min_concurrent_paths: usize,
    pub max_concurrent_paths: usize,
    pub max_expanded_nodes: usize,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_pathfinding_distance: 64,
            min_concurrent_paths: 8,
            max_concurrent_paths: 50,
            max_expanded_nodes: 4096,
        }
    }
}

impl MovementConfig {
    /// Hardware-scaled pathfinding pool size, clamped to this config's
    /// bounds. Callers that need a fixed pool size (tests, anything
    /// wanting deterministic concurrency) should pass their own count to
    /// `Runner::new`/`TickPipeline::new` instead of calling this.
    pub fn pool_size(&self) -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(self.min_concurrent_paths).clamp(self.min_concurrent_paths, self.max_concurrent_paths)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub price_threshold_low: u32,
    pub price_threshold_high: u32,
    pub price_multiplier_low: f32,
    pub price_multiplier_high: f32,
    pub auto_trade_interval: Duration,
    pub auto_trade_cooldown: Duration,
    pub auto_trade_seller_min_stock: u32,
    pub auto_trade_buyer_max_stock: u32,
    pub auto_trade_max_amount: u32,
    pub salary_interval: Duration,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            price_threshold_low: 10,
            price_threshold_high: 100,
            price_multiplier_low: 1.5,
            price_multiplier_high: 0.9,
            auto_trade_interval: Duration::from_secs(5),
            auto_trade_cooldown: Duration::from_secs(30),
            auto_trade_seller_min_stock: 15,
            auto_trade_buyer_max_stock: 3,
            auto_trade_max_amount: 5,
            salary_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub group_threshold: f32,
    pub proximity_reinforce_delta: f32,
    pub proximity_radius: f32,
    pub full_sweep_seconds: f32,
    pub deferred_recompute_min_period: Duration,
    /// Morale-bonus computation switches from a direct affinity-graph scan
    /// to the spatial-index-driven path once the living population is at
    /// least this large.
    pub social_accelerator_threshold: usize,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            group_threshold: 0.5,
            proximity_reinforce_delta: 0.05,
            proximity_radius: 12.0,
            full_sweep_seconds: 5.0,
            deferred_recompute_min_period: Duration::from_secs(5),
            social_accelerator_threshold: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Dispatch to the accelerator path once the pending query set is at
    /// least this many queries...
    pub accelerator_query_threshold: usize,
    /// ...over at least this many entities.
    pub accelerator_entity_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            accelerator_query_threshold: 50,
            accelerator_entity_threshold: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub hunger_death_threshold: f32,
    pub thirst_death_threshold: f32,
    pub energy_death_threshold: f32,
    /// Ticks a child lives before becoming an adult.
    pub child_to_adult_ticks: u64,
    /// Ticks an adult lives before becoming an elder.
    pub adult_to_elder_ticks: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            hunger_death_threshold: 0.0,
            thirst_death_threshold: 0.0,
            energy_death_threshold: 0.0,
            child_to_adult_ticks: 20 * 60 * 5,
            adult_to_elder_ticks: 20 * 60 * 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.clock.tick_rate_hz, 20.0);
        assert_eq!(cfg.clock.command_queue_capacity, 1024);
        assert_eq!(cfg.needs.critical_threshold, 15.0);
        assert_eq!(cfg.needs.satisfied_threshold, 70.0);
        assert_eq!(cfg.movement.max_concurrent_paths, 50);
        assert_eq!(cfg.movement.min_concurrent_paths, 8);
    }

    #[test]
    fn pool_size_stays_within_configured_bounds() {
        let mut cfg = MovementConfig::default();
        cfg.min_concurrent_paths = 3;
        cfg.max_concurrent_paths = 4;
        let size = cfg.pool_size();
        assert!(size >= 3 && size <= 4);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = SimConfig::from_toml("[clock]\ntick_rate_hz = 30.0\n").unwrap();
        assert_eq!(cfg.clock.tick_rate_hz, 30.0);
        assert_eq!(cfg.clock.command_queue_capacity, 1024);
    }
}
