//! `TickPipeline`: the fixed nine-step order every tick advances through
//! (`spec.md` §4.1 "Tick structure"). Owns every per-tick system and the
//! cross-tick state the lag-sensitive bits of the AI loop depend on
//! (`harvested_last_tick`, `pending_deaths`).

use crate::ai::action_planner::ActionPlanner;
use crate::ai::context::{GoalContext, InventorySummary, NeedKind};
use crate::ai::planner::plan_goal;
use crate::ai::priority::PriorityManager;
use crate::ai::rules::{default_rules, GoalRule};
use crate::ai::validator::AIGoalValidator;
use crate::commands::{AgentOverride, Command, NeedsCommand, SocialCommand, TimeCommand};
use crate::config::SimConfig;
use crate::events::{DeathCause, EventLog, SimEvent};
use crate::ids::{AgentId, ResourceId, ZoneId};
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::systems::animals;
use crate::systems::combat::CombatSystem;
use crate::systems::crafting::CraftingSystem;
use crate::systems::economy::EconomySystem;
use crate::systems::lifecycle::LifecycleSystem;
use crate::systems::movement::{MovementIntent, MovementState, MovementSystem};
use crate::systems::needs::NeedsSystem;
use crate::systems::roles;
use crate::systems::social::SocialSystem;
use crate::systems::time_of_day::TimeOfDaySystem;
use crate::world::agent::{AgentAIState, AgentNeeds, Goal, GoalTarget, GoalType, PrimitiveAction, Role};
use crate::world::inventory::{Inventory, ResourceKind};
use crate::world::resource::{ResourceState, ResourceType};
use crate::world::social::EdgeKey;
use crate::world::terrain::TerrainGrid;
use crate::world::zone::ZoneType;
use crate::world::WorldState;
use chrono::{DateTime, Utc};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Radius an `Explore` goal picks its random destination within.
const EXPLORE_RADIUS: f32 = 80.0;
/// Total carried load at or above which `has_excess_resources` fires for
/// the `deposit_excess` rule.
const EXCESS_CARRY_THRESHOLD: u32 = 40;
/// Mirrors `roles::SCARCITY_THRESHOLD`; kept local since that constant is
/// private to its own module.
const GLOBAL_SCARCITY_THRESHOLD: u32 = 20;

pub struct TickPipeline {
    terrain: Arc<TerrainGrid>,
    needs: NeedsSystem,
    movement: MovementSystem,
    economy: EconomySystem,
    social: SocialSystem,
    lifecycle: LifecycleSystem,
    crafting: CraftingSystem,
    combat: CombatSystem,
    time_of_day: TimeOfDaySystem,
    priority_mgr: PriorityManager,
    rules: Vec<GoalRule>,
    validator: AIGoalValidator,
    action_planner: ActionPlanner,
    snapshot_builder: SnapshotBuilder,
    /// Deaths detected by `NeedsSystem::tick` this tick, applied by
    /// `LifecycleSystem` at the start of the *next* tick's step 2 — the
    /// same one-tick lag `Command::KillAgent` rides to stay on a single
    /// code path.
    pending_deaths: Vec<(AgentId, DeathCause)>,
    /// Whether each agent's action harvested a resource last tick; read
    /// by `AIGoalValidator::is_completed` for `Hunt`/`Work` goals, which
    /// only complete after a harvest, never on arrival alone.
    harvested_last_tick: HashMap<AgentId, bool>,
    rng: Pcg64,
}

impl TickPipeline {
    pub fn new(terrain: Arc<TerrainGrid>, movement_pool_size: usize, seed: u64) -> Self {
        Self {
            terrain,
            needs: NeedsSystem::new(),
            movement: MovementSystem::new(movement_pool_size),
            economy: EconomySystem::new(),
            social: SocialSystem::new(),
            lifecycle: LifecycleSystem::new(),
            crafting: CraftingSystem::new(),
            combat: CombatSystem::new(),
            time_of_day: TimeOfDaySystem::new(),
            priority_mgr: PriorityManager,
            rules: default_rules(),
            validator: AIGoalValidator,
            action_planner: ActionPlanner,
            snapshot_builder: SnapshotBuilder::new(),
            pending_deaths: Vec::new(),
            harvested_last_tick: HashMap::new(),
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn weather(&self) -> crate::systems::time_of_day::Weather {
        self.time_of_day.weather
    }

    /// Runs one full tick and returns the resulting snapshot. `commands`
    /// must already be drained from the inbound queue by the caller.
    pub fn run_tick(
        &mut self,
        world: &mut WorldState,
        cfg: &SimConfig,
        tick: u64,
        timestamp: DateTime<Utc>,
        commands: Vec<Command>,
    ) -> Arc<Snapshot> {
        let mut events = EventLog::default();
        let dt = cfg.clock.tick_interval();

        // 1. Apply inbound commands.
        for command in commands {
            self.apply_command(world, cfg, tick, command, &mut events);
        }

        // 2. Lifecycle: deaths queued by step 1/3 of the previous tick,
        // respawns, aging, queued spawns, idle role assignment.
        self.combat.clear_tick_state();
        let deaths = std::mem::take(&mut self.pending_deaths);
        self.lifecycle.apply_deaths(world, &cfg.needs, &deaths, tick, cfg.clock.tick_rate_hz, &mut events);
        self.lifecycle.tick_respawns(world, tick, &mut events);
        self.lifecycle.tick_aging(world, &cfg.lifecycle);
        self.lifecycle.drain_spawns(world);
        roles::assign_idle_roles(world);

        // 3. Needs: morale bonus from the pre-tick social graph, decay,
        // consumption, death detection (applied next tick, see step 2).
        let morale_bonuses = self.social.compute_morale_bonuses(world, &cfg.social);
        let newly_dead = self.needs.tick(world, &cfg.needs, &cfg.lifecycle, dt, &mut events);
        self.needs.apply_morale_bonus(world, &morale_bonuses);
        self.pending_deaths = newly_dead;

        // 4. Ambient/spatial: animal wander, resource regrowth.
        animals::tick(world, &mut self.rng);
        for id in world.resources.keys().copied().collect::<Vec<_>>() {
            if let Some(mut resource) = world.get_resource_mut(id) {
                resource.tick_regrowth();
            }
        }

        // 5. Per-agent AI plan + action, panic-isolated.
        self.run_agent_decisions(world, cfg, tick, &mut events);

        // 6. Movement.
        self.movement.poll_paths(world, &mut events);
        self.movement.step(world, &mut events);

        // 7. Economy.
        self.economy.refresh_prices(world, &cfg.economy);
        self.economy.tick_auto_trade(world, &cfg.economy, dt, tick, cfg.clock.tick_rate_hz, &mut events);
        self.economy.tick_salaries(world, &cfg.economy, dt, tick, &mut events);

        // 8. Social.
        self.social.tick_proximity(world, &cfg.social, tick, cfg.clock.tick_rate_hz, &mut events);
        self.social.tick_deferred_recompute(world, &cfg.social, tick, cfg.clock.tick_rate_hz);

        // 9. Snapshot.
        world.tick = tick;
        let drained = events.drain();
        for event in &drained {
            if let SimEvent::Error { message } = event {
                tracing::warn!(error = %message, "simulation error event emitted this tick");
            }
        }
        self.snapshot_builder.build(world, tick, timestamp, drained, &self.crafting, &self.economy)
    }

    // -- Step 1: command application --------------------------------------

    fn apply_command(&mut self, world: &mut WorldState, cfg: &SimConfig, tick: u64, command: Command, events: &mut EventLog) {
        match command {
            Command::SetTimeScale { multiplier: _ } => {
                // Real-time pacing is the runner's concern; nothing for the
                // pipeline itself to do.
            }
            Command::ApplyResourceDelta { kind, delta } => {
                let entry = world.global_materials.entry(kind).or_insert(0);
                *entry = (*entry as i64 + delta).max(0) as u32;
            }
            Command::GatherResource { resource, amount } => self.apply_gather(world, resource, amount, events),
            Command::GiveResource { agent, kind, amount } => {
                if let Some(mut inv) = world.agent_inventory_mut(agent) {
                    inv.add(kind, amount);
                }
            }
            Command::SpawnAgent { profile } => self.lifecycle.enqueue_spawn(profile.unwrap_or_default()),
            Command::KillAgent { agent } => {
                if world.get_agent(agent).map(|a| !a.is_dead).unwrap_or(false) {
                    self.pending_deaths.push((agent, DeathCause::Other));
                }
            }
            Command::AgentCommand { agent, payload } => self.apply_agent_override(world, cfg, agent, payload),
            Command::NeedsCommand(cmd) => self.apply_needs_command(world, cmd),
            Command::SocialCommand(cmd) => self.apply_social_command(world, cfg, tick, cmd, events),
            Command::BuildingCommand(_) | Command::TaskCommand(_) => {
                tracing::debug!("building/task command accepted but has no backing system in this core");
            }
            Command::TimeCommand(TimeCommand::SetWeather { weather }) => self.time_of_day.set_weather(weather),
            Command::SaveGame { timestamp } => events.push(SimEvent::SaveRequested { timestamp }),
        }
    }

    fn apply_gather(&mut self, world: &mut WorldState, resource: ResourceId, amount: u32, events: &mut EventLog) {
        let Some(mut res) = world.get_resource_mut(resource) else {
            return;
        };
        let harvested = res.harvest(amount as f32);
        let depleted = res.state == ResourceState::Depleted;
        let kind = res.kind.yields();
        drop(res);
        if depleted {
            events.push(SimEvent::ResourceDepleted { resource });
        }
        if harvested > 0.0 {
            *world.global_materials.entry(kind).or_insert(0) += harvested as u32;
        }
    }

    fn apply_agent_override(&mut self, world: &mut WorldState, cfg: &SimConfig, agent: AgentId, payload: AgentOverride) {
        let Some(entity) = world.agent_entity(agent) else {
            return;
        };
        match payload {
            AgentOverride::MoveTo { target } => {
                if let Some(to) = self.resolve_target_position(world, &target) {
                    self.movement.request_move(world, &self.terrain, agent, to, &cfg.movement);
                }
                if let Some(mut ai) = world.ecs.get_mut::<AgentAIState>(entity) {
                    ai.current_goal = Some(Goal { goal_type: GoalType::Idle, target, priority: 1.0, created_at_tick: 0, params: Default::default() });
                }
            }
            AgentOverride::SetActivity { goal } => {
                if let Some(mut ai) = world.ecs.get_mut::<AgentAIState>(entity) {
                    ai.current_goal =
                        Some(Goal { goal_type: goal, target: GoalTarget::None, priority: 1.0, created_at_tick: 0, params: Default::default() });
                }
            }
        }
    }

    fn apply_needs_command(&mut self, world: &mut WorldState, cmd: NeedsCommand) {
        let (agent, need, delta) = match cmd {
            NeedsCommand::SatisfyNeed { agent, need, amount } => (agent, need, amount),
            NeedsCommand::ModifyNeed { agent, need, delta } => (agent, need, delta),
        };
        let Some(entity) = world.agent_entity(agent) else {
            return;
        };
        let Some(mut needs) = world.ecs.get_mut::<AgentNeeds>(entity) else {
            return;
        };
        match need {
            NeedKind::Hunger => needs.hunger += delta,
            NeedKind::Thirst => needs.thirst += delta,
            NeedKind::Energy => needs.energy += delta,
            NeedKind::Hygiene => needs.hygiene += delta,
            NeedKind::Social => needs.social += delta,
            NeedKind::Fun => needs.fun += delta,
            NeedKind::MentalHealth => needs.mental_health += delta,
        }
        needs.clamp_all();
    }

    fn apply_social_command(&mut self, world: &mut WorldState, cfg: &SimConfig, tick: u64, cmd: SocialCommand, events: &mut EventLog) {
        match cmd {
            SocialCommand::ImposeTruce { a, b } => self.social.set_affinity(world, a, b, 0.6, tick, &cfg.social, events),
            SocialCommand::SetAffinity { a, b, value } => self.social.set_affinity(world, a, b, value, tick, &cfg.social, events),
            SocialCommand::ModifyAffinity { a, b, delta } => self.social.modify_affinity(world, a, b, delta, tick, &cfg.social, events),
            SocialCommand::FriendlyInteraction { a, b } => self.social.modify_affinity(world, a, b, 0.1, tick, &cfg.social, events),
            SocialCommand::HostileEncounter { a, b } => self.social.modify_affinity(world, a, b, -0.2, tick, &cfg.social, events),
            SocialCommand::RemoveRelationship { a, b } => self.social.remove_relationship(world, a, b),
        }
    }

    fn resolve_target_position(&self, world: &WorldState, target: &GoalTarget) -> Option<Vec2> {
        match target {
            GoalTarget::Agent(id) => world.get_agent(*id).map(|a| a.position),
            GoalTarget::Resource(id) => world.get_resource(*id).map(|r| r.position),
            GoalTarget::Zone(id) => world.zones.get(id).map(|z| z.bounds.center()),
            GoalTarget::Position(p) => Some(*p),
            GoalTarget::None => None,
        }
    }

    // -- Step 5: per-agent decision + action --------------------------------

    fn run_agent_decisions(&mut self, world: &mut WorldState, cfg: &SimConfig, tick: u64, events: &mut EventLog) {
        let mut harvested_this_tick = HashMap::new();
        for agent in world.living_agent_ids() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                self.decide_and_act(world, cfg, tick, agent, events, &mut harvested_this_tick);
            }));
            if result.is_err() {
                events.push(SimEvent::Error { message: format!("agent {agent} panicked during decision and was skipped this tick") });
            }
        }
        self.harvested_last_tick = harvested_this_tick;
    }

    fn decide_and_act(
        &mut self,
        world: &mut WorldState,
        cfg: &SimConfig,
        tick: u64,
        agent: AgentId,
        events: &mut EventLog,
        harvested_this_tick: &mut HashMap<AgentId, bool>,
    ) {
        let Some(entity) = world.agent_entity(agent) else {
            return;
        };

        let arrived = matches!(
            world.ecs.get::<MovementIntent>(entity).map(|i| i.state.clone()),
            Some(MovementState::Arrived { .. }) | Some(MovementState::Idle)
        );
        let harvested_last = self.harvested_last_tick.get(&agent).copied().unwrap_or(false);

        let ctx = self.build_context(world, cfg, agent, tick);
        let mut goal = world.ecs.get::<AgentAIState>(entity).and_then(|s| s.current_goal.clone());

        if let Some(g) = &goal {
            let completed = self.validator.is_completed(g, world, agent, &cfg.needs, arrived, harvested_last);
            let invalid = self.validator.is_invalid(g, world, tick);
            if completed || invalid {
                goal = None;
            }
        }

        if goal.is_none() {
            goal = plan_goal(&ctx, &self.rules, &self.priority_mgr, tick);
        }

        let Some(goal) = goal else {
            return;
        };

        let target_zone_id = target_zone(&goal.target).or(if goal.goal_type == GoalType::Work { ctx.craft_zone_id } else { None });
        let in_target_zone = match target_zone_id {
            Some(zone_id) => match (world.get_agent(agent).map(|a| a.position), world.zones.get(&zone_id)) {
                (Some(pos), Some(zone)) => zone.contains(pos),
                _ => false,
            },
            None => false,
        };
        let target_pos = self.resolve_goal_target(world, &ctx, &goal, target_zone_id);

        let action = self.action_planner.plan(&goal, &ctx, target_pos, in_target_zone);
        let harvested = self.execute_action(world, cfg, tick, agent, &goal, action, target_pos, events);
        harvested_this_tick.insert(agent, harvested);

        if let Some(mut ai) = world.ecs.get_mut::<AgentAIState>(entity) {
            ai.current_action = Some(action);
            ai.last_decision_tick = tick;
            ai.current_goal = Some(goal);
        }
    }

    fn resolve_goal_target(&mut self, world: &WorldState, ctx: &GoalContext, goal: &Goal, target_zone_id: Option<ZoneId>) -> Option<Vec2> {
        match goal.goal_type {
            GoalType::Flee => self.resolve_flee_target(world, ctx),
            GoalType::Explore => Some(self.resolve_explore_target(ctx)),
            GoalType::Work => target_zone_id.and_then(|id| world.zones.get(&id)).map(|z| z.bounds.center()),
            _ => self.resolve_target_position(world, &goal.target),
        }
    }

    fn resolve_flee_target(&self, world: &WorldState, ctx: &GoalContext) -> Option<Vec2> {
        if let Some((_, enemy_pos)) = ctx.nearest_enemy {
            return Some(flee_away_from(ctx.position, enemy_pos));
        }
        let (threat, _) = world.spatial_index.find_nearest(ctx.position, 200.0, |id| {
            id.as_animal().and_then(|aid| world.get_animal(aid)).map(|a| !a.is_dead && a.kind.is_predator()).unwrap_or(false)
        })?;
        let threat_pos = world.get_animal(threat.as_animal()?)?.position;
        Some(flee_away_from(ctx.position, threat_pos))
    }

    fn resolve_explore_target(&mut self, ctx: &GoalContext) -> Vec2 {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let radius = self.rng.gen_range(10.0..EXPLORE_RADIUS);
        ctx.position + Vec2::new(angle.cos(), angle.sin()) * radius
    }

    fn build_context(&self, world: &WorldState, cfg: &SimConfig, agent: AgentId, tick: u64) -> GoalContext {
        let _ = tick;
        let mut ctx = GoalContext::default();
        ctx.critical_threshold = cfg.needs.critical_threshold;
        let Some(entity) = world.agent_entity(agent) else {
            return ctx;
        };
        let Some(agent_data) = world.get_agent(agent) else {
            return ctx;
        };

        ctx.agent = Some(agent);
        ctx.position = agent_data.position;
        ctx.role = Some(agent_data.role);

        if let Some(needs) = world.ecs.get::<AgentNeeds>(entity) {
            ctx.needs = [needs.hunger, needs.thirst, needs.energy, needs.hygiene, needs.social, needs.fun, needs.mental_health];
        }
        if let Some(inv) = world.ecs.get::<Inventory>(entity) {
            ctx.inventory = InventorySummary {
                load: inv.total(),
                capacity: inv.capacity,
                has_food: !inv.is_empty_of(ResourceKind::Food),
                has_water: !inv.is_empty_of(ResourceKind::Water),
            };
            ctx.has_excess_resources = inv.total() >= EXCESS_CARRY_THRESHOLD;
        }

        ctx.nearest_food = nearest_resource(world, ctx.position, ResourceType::BerryBush);
        ctx.nearest_water = nearest_resource(world, ctx.position, ResourceType::WaterSource);

        ctx.nearest_agent = world
            .spatial_index
            .find_nearest(ctx.position, cfg.social.proximity_radius.max(30.0), |id| id.as_agent().map(|other| other != agent).unwrap_or(false))
            .and_then(|(id, _)| id.as_agent())
            .and_then(|id| world.get_agent(id).map(|a| (id, a.position)));

        ctx.is_in_combat = self.combat.is_in_combat(agent);
        ctx.nearby_predators = animals::nearby_predator_count(world, ctx.position) > 0;

        ctx.nearest_enemy = world
            .spatial_index
            .find_nearest(ctx.position, 60.0, |id| {
                id.as_agent()
                    .filter(|&other| other != agent)
                    .and_then(|other| world.get_agent(other))
                    .map(|a| !a.is_dead)
                    .unwrap_or(false)
            })
            .and_then(|(id, _)| id.as_agent())
            .filter(|&other| world.social_graph.get(&EdgeKey::new(agent, other)).map(|e| e.affinity < -0.3).unwrap_or(false))
            .and_then(|id| world.get_agent(id).map(|a| (id, a.position)));
        ctx.has_enemies = ctx.nearest_enemy.is_some();

        ctx.craft_zone_id = nearest_zone(world, ctx.position, ZoneType::Work);
        ctx.deposit_zone_id = nearest_zone(world, ctx.position, ZoneType::Storage);

        // No building/task system exists in this core; these stay
        // permanently false rather than modeling a system that isn't built.
        ctx.active_quest_goal = false;
        ctx.contributable_building = false;

        let stock_of = |kind: ResourceKind| world.global_materials.get(&kind).copied().unwrap_or(0);
        ctx.global_food_scarce = stock_of(ResourceKind::Food) < GLOBAL_SCARCITY_THRESHOLD;
        ctx.global_water_scarce = stock_of(ResourceKind::Water) < GLOBAL_SCARCITY_THRESHOLD;
        ctx.global_wood_scarce = stock_of(ResourceKind::Wood) < GLOBAL_SCARCITY_THRESHOLD;
        ctx.global_stone_scarce = stock_of(ResourceKind::Stone) < GLOBAL_SCARCITY_THRESHOLD;

        ctx
    }

    // -- Step 5: action execution -------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn execute_action(
        &mut self,
        world: &mut WorldState,
        cfg: &SimConfig,
        tick: u64,
        agent: AgentId,
        goal: &Goal,
        action: PrimitiveAction,
        target_pos: Option<Vec2>,
        events: &mut EventLog,
    ) -> bool {
        match action {
            PrimitiveAction::Move => {
                if let Some(to) = target_pos {
                    let idle_or_arrived = world
                        .agent_entity(agent)
                        .and_then(|e| world.ecs.get::<MovementIntent>(e).map(|i| matches!(i.state, MovementState::Idle | MovementState::Arrived { .. })))
                        .unwrap_or(false);
                    if idle_or_arrived {
                        self.movement.request_move(world, &self.terrain, agent, to, &cfg.movement);
                    }
                }
                false
            }
            PrimitiveAction::Harvest => self.execute_harvest(world, agent, goal, events),
            PrimitiveAction::Attack => {
                if let Some(target) = target_agent(&goal.target) {
                    self.combat.attack(world, agent, target, &mut self.pending_deaths, events);
                }
                false
            }
            PrimitiveAction::Craft => match goal.goal_type {
                GoalType::Work => self.execute_work(world, agent),
                _ => target_zone(&goal.target).map(|zone| self.crafting.advance(world, agent, zone)).unwrap_or(false),
            },
            PrimitiveAction::Deposit => {
                self.execute_deposit(world, agent, goal);
                false
            }
            PrimitiveAction::Socialize => {
                if let Some(other) = target_agent(&goal.target) {
                    self.social.modify_affinity(world, agent, other, 0.05, tick, &cfg.social, events);
                }
                false
            }
            PrimitiveAction::Sleep | PrimitiveAction::Idle | PrimitiveAction::Mate | PrimitiveAction::Consume => false,
        }
    }

    fn execute_harvest(&mut self, world: &mut WorldState, agent: AgentId, goal: &Goal, events: &mut EventLog) -> bool {
        let Some(resource_id) = target_resource(&goal.target) else {
            return false;
        };
        let Some(mut resource) = world.get_resource_mut(resource_id) else {
            return false;
        };
        let harvested = resource.harvest(1.0);
        let depleted = resource.state == ResourceState::Depleted;
        let kind = resource.kind.yields();
        drop(resource);
        if depleted {
            events.push(SimEvent::ResourceDepleted { resource: resource_id });
        }
        if harvested <= 0.0 {
            return false;
        }
        let added = world.agent_inventory_mut(agent).map(|mut inv| inv.add(kind, 1)).unwrap_or(0);
        if added == 0 {
            *world.global_materials.entry(kind).or_insert(0) += 1;
        }
        if let Some(entity) = world.agent_entity(agent) {
            if let Some(mut needs) = world.ecs.get_mut::<AgentNeeds>(entity) {
                match goal.goal_type {
                    GoalType::SatisfyHunger => needs.hunger = (needs.hunger + 15.0).min(100.0),
                    GoalType::SatisfyThirst => needs.thirst = (needs.thirst + 20.0).min(100.0),
                    _ => {}
                }
            }
        }
        true
    }

    /// Dispatches `GoalType::Work` to the role-based resource yield
    /// (`EconomySystem::handle_work_action`), distinct from `GoalType::Craft`
    /// which dispatches to `CraftingSystem::advance` — both resolve to the
    /// same `PrimitiveAction::Craft`, but the target system differs by goal
    /// type, which only the executor still has in scope.
    fn execute_work(&mut self, world: &mut WorldState, agent: AgentId) -> bool {
        let Some(position) = world.get_agent(agent).map(|a| a.position) else {
            return false;
        };
        let Some(role) = world.get_agent(agent).map(|a| a.role) else {
            return false;
        };
        let kind = match role {
            Role::Farmer | Role::Hunter => ResourceKind::Food,
            Role::Logger | Role::Gatherer => ResourceKind::Wood,
            Role::Quarryman => ResourceKind::Stone,
            _ => return false,
        };
        let base_yield = match kind {
            ResourceKind::Food => ResourceType::BerryBush.base_yield(),
            ResourceKind::Wood => ResourceType::Tree.base_yield(),
            ResourceKind::Stone => ResourceType::Rock.base_yield(),
            _ => 1.0,
        } * 0.1;

        let zone_population = world
            .zone_at(position)
            .map(|zone| world.spatial_index.query_radius(zone.bounds.center(), 40.0, |id| id.as_agent().is_some()).len() as u32)
            .unwrap_or(1);

        self.economy.handle_work_action(world, agent, kind, base_yield, zone_population) > 0
    }

    fn execute_deposit(&mut self, world: &mut WorldState, agent: AgentId, goal: &Goal) {
        let Some(zone_id) = target_zone(&goal.target) else {
            return;
        };
        let carried: Vec<(ResourceKind, u32)> = match world.agent_inventory(agent) {
            Some(inv) => ResourceKind::ALL.iter().map(|&k| (k, inv.get(k))).filter(|&(_, n)| n > 0).collect(),
            None => return,
        };
        for (kind, amount) in carried {
            let removed = world.agent_inventory_mut(agent).map(|mut inv| inv.remove(kind, amount)).unwrap_or(0);
            if removed == 0 {
                continue;
            }
            if let Some(zone) = world.zones.get_mut(&zone_id) {
                zone.stockpile.add(kind, removed);
            } else if let Some(mut inv) = world.agent_inventory_mut(agent) {
                inv.add(kind, removed);
            }
        }
    }
}

fn flee_away_from(from: Vec2, threat: Vec2) -> Vec2 {
    let away = (from - threat).normalize_or_zero();
    let direction = if away == Vec2::ZERO { Vec2::new(1.0, 0.0) } else { away };
    from + direction * 40.0
}

fn target_agent(target: &GoalTarget) -> Option<AgentId> {
    match target {
        GoalTarget::Agent(id) => Some(*id),
        _ => None,
    }
}

fn target_zone(target: &GoalTarget) -> Option<ZoneId> {
    match target {
        GoalTarget::Zone(id) => Some(*id),
        _ => None,
    }
}

fn target_resource(target: &GoalTarget) -> Option<ResourceId> {
    match target {
        GoalTarget::Resource(id) => Some(*id),
        _ => None,
    }
}

fn nearest_resource(world: &WorldState, position: Vec2, kind: ResourceType) -> Option<(ResourceId, Vec2)> {
    let (id, _) = world.spatial_index.find_nearest(position, 300.0, |id| {
        id.as_resource().and_then(|rid| world.get_resource(rid)).map(|r| r.kind == kind && r.state == ResourceState::Pristine).unwrap_or(false)
    })?;
    let rid = id.as_resource()?;
    world.get_resource(rid).map(|r| (rid, r.position))
}

fn nearest_zone(world: &WorldState, position: Vec2, zone_type: ZoneType) -> Option<ZoneId> {
    world
        .zones
        .values()
        .filter(|z| z.zone_type == zone_type)
        .min_by(|a, b| {
            a.bounds.center().distance_squared(position).total_cmp(&b.bounds.center().distance_squared(position))
        })
        .map(|z| z.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::agent::Role;
    use crate::world::terrain::TileType;
    use crate::world::AgentProfile;

    fn make_world() -> WorldState {
        WorldState::new(TerrainGrid::new_flat(64, 64, TileType::Grass))
    }

    #[test]
    fn idle_agent_with_no_pressure_falls_back_to_explore_or_idle() {
        let mut world = make_world();
        let agent = world.add_agent(AgentProfile { position: Some(Vec2::new(32.0, 32.0)), role: Some(Role::Idle) });
        let mut pipeline = TickPipeline::new(Arc::new(TerrainGrid::new_flat(64, 64, TileType::Grass)), 2, 42);
        let cfg = SimConfig::default();
        let snapshot = pipeline.run_tick(&mut world, &cfg, 0, chrono::Utc::now(), Vec::new());
        let agent_snapshot = snapshot.agents.iter().find(|a| a.id == agent).unwrap();
        assert!(matches!(agent_snapshot.current_goal, Some(GoalType::Explore) | Some(GoalType::Idle) | None));
    }

    #[test]
    fn two_runs_with_identical_seed_and_commands_produce_identical_snapshots() {
        let run = || {
            let mut world = make_world();
            world.add_agent(AgentProfile { position: Some(Vec2::new(10.0, 10.0)), role: Some(Role::Idle) });
            world.add_animal(crate::world::animal::AnimalKind::Rabbit, Vec2::new(20.0, 20.0));
            let mut pipeline = TickPipeline::new(Arc::new(TerrainGrid::new_flat(64, 64, TileType::Grass)), 2, 7);
            let cfg = SimConfig::default();
            let timestamp = chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap();
            let mut last = None;
            for tick in 0..5 {
                last = Some(pipeline.run_tick(&mut world, &cfg, tick, timestamp, Vec::new()));
            }
            last.unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(serde_json::to_string(&*a).unwrap(), serde_json::to_string(&*b).unwrap());
    }

    #[test]
    fn save_game_command_emits_save_requested_event() {
        let mut world = make_world();
        let mut pipeline = TickPipeline::new(Arc::new(TerrainGrid::new_flat(64, 64, TileType::Grass)), 2, 1);
        let cfg = SimConfig::default();
        let snapshot = pipeline.run_tick(&mut world, &cfg, 0, chrono::Utc::now(), vec![Command::SaveGame { timestamp: 123 }]);
        assert!(snapshot.events.iter().any(|e| matches!(e, SimEvent::SaveRequested { timestamp: 123 })));
    }
}
