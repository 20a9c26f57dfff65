//! Minimal local bootstrap for `agent_sim_core`. Spawns a flat-terrain
//! world with a handful of agents, drives the `Runner` for a fixed
//! number of ticks, and logs a summary snapshot every second of sim
//! time. Real bootstrap/config-loading/transport glue is out of this
//! crate's scope (`spec.md` §1) — this binary exists only so the core
//! can be exercised end to end without a host application.

use agent_sim_core::config::SimConfig;
use agent_sim_core::world::agent::Role;
use agent_sim_core::world::terrain::{TerrainGrid, TileType};
use agent_sim_core::world::{AgentProfile, WorldState};
use agent_sim_core::Runner;
use clap::Parser;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sim-runner")]
#[command(about = "Runs the agent simulation core standalone for local inspection", long_about = None)]
struct Args {
    /// Optional TOML config file; falls back to built-in defaults for any field it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of agents to spawn on a flat starting world.
    #[arg(long, default_value_t = 50)]
    agents: usize,

    /// Side length of the flat terrain grid.
    #[arg(long, default_value_t = 128)]
    world_size: i32,

    /// Number of ticks to run before exiting. Runs until Ctrl-C if unset.
    #[arg(long)]
    ticks: Option<u64>,

    /// Deterministic RNG seed (`spec.md` §8 S6 "Determinism").
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("agent_sim_core=info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
                tracing::error!(path = %path.display(), error = %e, "failed to read config file");
                std::process::exit(1);
            });
            SimConfig::from_toml(&text).unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to parse config file");
                std::process::exit(1);
            })
        }
        None => SimConfig::default(),
    };

    let mut world = WorldState::new(TerrainGrid::new_flat(args.world_size, args.world_size, TileType::Grass));
    let roles = [
        Role::Farmer,
        Role::Logger,
        Role::Quarryman,
        Role::Hunter,
        Role::Builder,
        Role::Craftsman,
        Role::Guard,
        Role::Gatherer,
        Role::Idle,
    ];
    for i in 0..args.agents {
        let position = Vec2::new((i as f32 * 7.0) % args.world_size as f32, (i as f32 * 11.0) % args.world_size as f32);
        world.add_agent(AgentProfile { position: Some(position), role: Some(roles[i % roles.len()]) });
    }

    let terrain = Arc::new(TerrainGrid::new_flat(args.world_size, args.world_size, TileType::Grass));
    let movement_pool_size = config.movement.pool_size();
    let runner = Runner::new(world, config.clone(), terrain, movement_pool_size, args.seed);

    tracing::info!(agents = args.agents, world_size = args.world_size, seed = args.seed, "starting simulation");
    runner.start();

    let log_every = (config.clock.tick_rate_hz.max(1.0)) as u64;
    let deadline = args.ticks;
    loop {
        std::thread::sleep(Duration::from_millis(200));
        let tick = runner.tick();
        if tick > 0 && tick % log_every == 0 {
            if let Some(snapshot) = runner.latest_snapshot() {
                let alive = snapshot.agents.iter().filter(|a| !a.is_dead).count();
                tracing::info!(tick = snapshot.tick, alive, total = snapshot.agents.len(), events = snapshot.events.len(), "tick summary");
            }
        }
        if let Some(limit) = deadline {
            if tick >= limit {
                break;
            }
        }
    }

    runner.stop();
    tracing::info!(final_tick = runner.tick(), "simulation stopped");
}
