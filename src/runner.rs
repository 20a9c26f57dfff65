//! Clock & Runner (`spec.md` §4.1). Drives ticks at a fixed rate, drains
//! the inbound command queue, invokes `TickPipeline::run_tick` in the
//! fixed system order, and emits a snapshot. Owns cancellation and
//! shutdown; the ambient-async teacher pattern collapses to a single
//! background thread plus a handful of atomics (`spec.md` §9).

use crate::commands::{Command, CommandQueue};
use crate::config::SimConfig;
use crate::snapshot::Snapshot;
use crate::tick::TickPipeline;
use crate::world::terrain::TerrainGrid;
use crate::world::WorldState;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

struct Engine {
    world: WorldState,
    pipeline: TickPipeline,
    config: SimConfig,
}

/// Drives `TickPipeline` at a fixed rate on a dedicated thread.
/// `enqueue_command`, `tick`, and `latest_snapshot` are safe to call from
/// any thread while ticking is underway; `start`/`stop` are not meant to
/// be called concurrently with each other.
pub struct Runner {
    engine: Mutex<Engine>,
    commands: Mutex<CommandQueue>,
    time_scale: Mutex<f64>,
    stop_flag: Arc<AtomicBool>,
    tick_counter: Arc<AtomicU64>,
    latest_snapshot: Mutex<Option<Arc<Snapshot>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Runner {
    pub fn new(world: WorldState, config: SimConfig, terrain: Arc<TerrainGrid>, movement_pool_size: usize, seed: u64) -> Arc<Self> {
        let capacity = config.clock.command_queue_capacity;
        let pipeline = TickPipeline::new(terrain, movement_pool_size, seed);
        Arc::new(Self {
            engine: Mutex::new(Engine { world, pipeline, config }),
            commands: Mutex::new(CommandQueue::new(capacity)),
            time_scale: Mutex::new(1.0),
            stop_flag: Arc::new(AtomicBool::new(false)),
            tick_counter: Arc::new(AtomicU64::new(0)),
            latest_snapshot: Mutex::new(None),
            thread: Mutex::new(None),
        })
    }

    /// Non-blocking; returns `false` once the bounded queue is full
    /// (`spec.md` §4.1 "enqueueCommand(cmd) -> accepted: bool").
    pub fn enqueue_command(&self, command: Command) -> bool {
        self.commands.lock().expect("command queue lock poisoned").enqueue(command)
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter.load(Ordering::Acquire)
    }

    pub fn latest_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.latest_snapshot.lock().expect("snapshot lock poisoned").clone()
    }

    /// Runs exactly one tick to completion and returns its snapshot.
    /// Used directly by tests and by the background loop spawned from
    /// `start`. Draining the command queue and running the pipeline
    /// happen under the same lock, so a tick is never observed
    /// half-applied by another caller.
    pub fn step(&self) -> Arc<Snapshot> {
        let mut engine = self.engine.lock().expect("engine lock poisoned");
        let max_commands = engine.config.clock.max_commands_per_tick;
        let drained = self.commands.lock().expect("command queue lock poisoned").drain(max_commands);
        for command in &drained {
            if let Command::SetTimeScale { multiplier } = command {
                *self.time_scale.lock().expect("time scale lock poisoned") = multiplier.max(0.0);
            }
        }
        let tick = self.tick_counter.fetch_add(1, Ordering::AcqRel);
        let snapshot = engine.pipeline.run_tick(&mut engine.world, &engine.config, tick, chrono::Utc::now(), drained);
        *self.latest_snapshot.lock().expect("snapshot lock poisoned") = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Begins periodic ticking at the configured rate (adjusted by the
    /// last-applied `SET_TIME_SCALE`) on a background thread. No-op if
    /// already running.
    pub fn start(self: &Arc<Self>) {
        let mut guard = self.thread.lock().expect("thread handle lock poisoned");
        if guard.is_some() {
            return;
        }
        self.stop_flag.store(false, Ordering::SeqCst);
        let this = Arc::clone(self);
        *guard = Some(std::thread::spawn(move || this.run_loop()));
    }

    fn run_loop(self: Arc<Self>) {
        while !self.stop_flag.load(Ordering::SeqCst) {
            let base_interval = self.engine.lock().expect("engine lock poisoned").config.clock.tick_interval();
            let scale = *self.time_scale.lock().expect("time scale lock poisoned");
            let interval = if scale > 0.0 { base_interval.div_f64(scale) } else { base_interval };

            let started = Instant::now();
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.step()));
            if let Err(payload) = result {
                tracing::error!(tick = self.tick(), ?payload, "tick panicked; runner continues with the next tick");
            }
            let elapsed = started.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
    }

    /// Halts ticking after the current tick completes, joining the
    /// background thread. No-op if not running.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.lock().expect("thread handle lock poisoned").take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.lock().expect("thread handle lock poisoned").is_some()
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.lock().expect("thread handle lock poisoned").take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::agent::Role;
    use crate::world::terrain::TileType;
    use crate::world::AgentProfile;
    use glam::Vec2;

    fn make_runner() -> Arc<Runner> {
        let mut world = WorldState::new(TerrainGrid::new_flat(32, 32, TileType::Grass));
        world.add_agent(AgentProfile { position: Some(Vec2::new(5.0, 5.0)), role: Some(Role::Idle) });
        let terrain = Arc::new(TerrainGrid::new_flat(32, 32, TileType::Grass));
        Runner::new(world, SimConfig::default(), terrain, 2, 1)
    }

    #[test]
    fn step_advances_tick_and_publishes_snapshot() {
        let runner = make_runner();
        assert_eq!(runner.tick(), 0);
        let snapshot = runner.step();
        assert_eq!(snapshot.tick, 0);
        assert_eq!(runner.tick(), 1);
        assert_eq!(runner.latest_snapshot().unwrap().tick, 0);
    }

    #[test]
    fn enqueue_fails_past_configured_capacity() {
        let mut world = WorldState::new(TerrainGrid::new_flat(8, 8, TileType::Grass));
        world.add_agent(AgentProfile::default());
        let mut config = SimConfig::default();
        config.clock.command_queue_capacity = 1;
        let terrain = Arc::new(TerrainGrid::new_flat(8, 8, TileType::Grass));
        let runner = Runner::new(world, config, terrain, 1, 1);
        assert!(runner.enqueue_command(Command::SetTimeScale { multiplier: 1.0 }));
        assert!(!runner.enqueue_command(Command::SetTimeScale { multiplier: 2.0 }));
    }

    #[test]
    fn enqueued_commands_are_applied_on_the_next_step() {
        let mut world = WorldState::new(TerrainGrid::new_flat(16, 16, TileType::Grass));
        let agent = world.add_agent(AgentProfile { position: Some(Vec2::new(1.0, 1.0)), role: Some(Role::Idle) });
        let terrain = Arc::new(TerrainGrid::new_flat(16, 16, TileType::Grass));
        let runner = Runner::new(world, SimConfig::default(), terrain, 1, 1);
        assert!(runner.enqueue_command(Command::GiveResource {
            agent,
            kind: crate::world::inventory::ResourceKind::Food,
            amount: 4,
        }));
        let snapshot = runner.step();
        let found = snapshot.agents.iter().any(|a| a.id == agent);
        assert!(found);
    }

    #[test]
    fn start_then_stop_runs_at_least_one_tick_and_halts_cleanly() {
        let mut world = WorldState::new(TerrainGrid::new_flat(8, 8, TileType::Grass));
        world.add_agent(AgentProfile::default());
        let mut config = SimConfig::default();
        config.clock.tick_rate_hz = 200.0;
        let terrain = Arc::new(TerrainGrid::new_flat(8, 8, TileType::Grass));
        let runner = Runner::new(world, config, terrain, 1, 1);

        runner.start();
        assert!(runner.is_running());
        let deadline = Instant::now() + std::time::Duration::from_secs(2);
        while runner.tick() == 0 && Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        runner.stop();
        assert!(!runner.is_running());
        assert!(runner.tick() >= 1);
    }

    #[test]
    fn starting_twice_does_not_spawn_a_second_loop() {
        let runner = make_runner();
        runner.start();
        runner.start();
        std::thread::sleep(std::time::Duration::from_millis(20));
        runner.stop();
    }
}
