//! # Simulation
//!
//! The aggregate that owns everything authoritative: the world, actors,
//! bullets, kills, bot memory and the simulation random stream. The server
//! owns one `Simulation` and hands it to whichever task needs it; nothing in
//! here is global.
//!
//! ## Step order
//!
//! ```text
//! step(now)
//!   1. bots decide, move and queue shots
//!   2. bullets advance and resolve hits
//!   3. dead actors past the respawn delay come back
//!   4. the kill book rotates if its interval elapsed
//! ```
//!
//! A shot queued in (1) first moves in (2) of the same step. Nothing is
//! resolved at the moment of firing.

use crate::actor::{Actor, ActorId, ActorKind, ActorStore};
use crate::bot::{aim, decide, BotArchetype, BotContext, BotSettings, BotState, Movement, Perception};
use crate::config::{GameConfig, PerArchetype};
use crate::error::SimResult;
use crate::kills::{KillBook, KillLog, KillRecord};
use crate::projectile::{Bullet, ProjectileSystem};
use rand_chacha::ChaCha8Rng;
use skirmish_shared::{Rotation, Vec3};
use skirmish_world::{CollisionIndex, WorldGenerator, WorldLayout, WorldSeed, SIMULATION_STREAM};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Killer id used by the admin kill command.
pub const ADMIN_KILLER_ID: &str = "debug-admin";
/// Killer name used by the admin kill command.
pub const ADMIN_KILLER_NAME: &str = "Admin";

/// What one [`Simulation::step`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Tick number that just ran.
    pub tick: u64,
    /// Bullets fired by bots this step.
    pub fired: Vec<Bullet>,
    /// Bullets that hit someone.
    pub hits: u32,
    /// Kills caused this step.
    pub kills: Vec<KillRecord>,
    /// Actors that came back this step.
    pub respawned: Vec<ActorId>,
}

/// Authoritative game state.
#[derive(Debug)]
pub struct Simulation {
    config: GameConfig,
    seed: WorldSeed,
    layout: Arc<WorldLayout>,
    world: Arc<CollisionIndex>,
    rng: ChaCha8Rng,
    actors: ActorStore,
    projectiles: ProjectileSystem,
    kills: KillBook,
    bots: BTreeMap<ActorId, BotState>,
    bot_settings: PerArchetype<BotSettings>,
    tick: u64,
    next_player: u64,
}

impl Simulation {
    /// Generates a world, opens the kill log and spawns the configured bots.
    ///
    /// Uses `world.seed` from the config or picks one from the clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the world fails validation or the kill log
    /// cannot be opened.
    pub fn new(config: GameConfig) -> SimResult<Self> {
        let seed = config.world.seed.map_or_else(WorldSeed::from_clock, WorldSeed::new);
        info!(seed = seed.value(), "using world seed");
        let layout = WorldGenerator::new(seed, config.arena.half_size, config.arena.spawn_y, config.world.clone())
            .generate()?;
        let kill_log = if config.kill_log.enabled {
            Some(KillLog::open(&config.kill_log.path)?)
        } else {
            None
        };
        Ok(Self::with_layout(config, seed, layout, kill_log))
    }

    /// Builds a simulation around an existing layout.
    #[must_use]
    pub fn with_layout(config: GameConfig, seed: WorldSeed, layout: WorldLayout, kill_log: Option<KillLog>) -> Self {
        let world = CollisionIndex::build(&layout, config.arena.spawn_y, config.player.radius, config.player.height);
        let projectiles = ProjectileSystem::new(&config.combat, config.network.collision_grid_cell_size);
        let kills = KillBook::new(kill_log, config.kill_log.reset_secs.saturating_mul(1000));
        let tuning = &config.bots.settings;
        let bot_settings = PerArchetype {
            dumb: BotSettings::resolve(BotArchetype::Dumb, &tuning.dumb),
            simple: BotSettings::resolve(BotArchetype::Simple, &tuning.simple),
            seeking: BotSettings::resolve(BotArchetype::Seeking, &tuning.seeking),
            teleporting: BotSettings::resolve(BotArchetype::Teleporting, &tuning.teleporting),
            danger: BotSettings::resolve(BotArchetype::Danger, &tuning.danger),
            monsters: BotSettings::resolve(BotArchetype::Monsters, &tuning.monsters),
        };

        let mut simulation = Self {
            actors: ActorStore::new(config.player.max_health),
            rng: seed.rng(SIMULATION_STREAM),
            config,
            seed,
            layout: Arc::new(layout),
            world: Arc::new(world),
            projectiles,
            kills,
            bots: BTreeMap::new(),
            bot_settings,
            tick: 0,
            next_player: 0,
        };
        simulation.spawn_bots();
        simulation
    }

    fn spawn_bots(&mut self) {
        for archetype in BotArchetype::ALL {
            let count = *self.config.bots.counts.get(archetype);
            let color = self.config.bots.color(archetype);
            for n in 1..=count {
                let id = ActorId::new(format!("bot-{archetype}-{n}"));
                let name = format!("{archetype}{n}");
                let kind = ActorKind::Bot { archetype, color };
                self.actors.add(id.clone(), Some(&name), kind, &self.world, &mut self.rng);
                self.bots.insert(id, BotState::new(archetype));
            }
        }
        info!(bots = self.bots.len(), "bots spawned");
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed the world was generated from.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The generated arena.
    #[must_use]
    pub fn layout(&self) -> &Arc<WorldLayout> {
        &self.layout
    }

    /// Collision queries over the arena.
    #[must_use]
    pub fn world(&self) -> &Arc<CollisionIndex> {
        &self.world
    }

    /// Every actor.
    #[must_use]
    pub fn actors(&self) -> &ActorStore {
        &self.actors
    }

    /// One actor.
    #[must_use]
    pub fn actor(&self, id: &str) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// Bullets in flight.
    #[must_use]
    pub fn bullets(&self) -> &[Bullet] {
        self.projectiles.bullets()
    }

    /// Kill history since the last rotation.
    #[must_use]
    pub fn kills(&self) -> &KillBook {
        &self.kills
    }

    /// Scratch state of a bot.
    #[must_use]
    pub fn bot_state(&self, id: &str) -> Option<&BotState> {
        self.bots.get(id)
    }

    /// Steps run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Connected players (not bots).
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.actors.iter().filter(|a| !a.is_bot()).count()
    }

    /// Allocates an id and adds a player with a generated name.
    pub fn join(&mut self) -> ActorId {
        self.next_player += 1;
        let id = ActorId::new(format!("player-{}", self.next_player));
        self.add_player(id.clone(), None);
        id
    }

    /// Adds a player under a caller-chosen id.
    pub fn add_player(&mut self, id: ActorId, name: Option<&str>) -> &Actor {
        self.actors.add(id, name, ActorKind::Player, &self.world, &mut self.rng)
    }

    /// Removes an actor (and its bot memory). Its bullets keep flying.
    pub fn remove(&mut self, id: &str) -> Option<Actor> {
        self.bots.remove(id);
        self.actors.remove(id)
    }

    /// Applies a client move. Ignored for unknown or dead actors.
    pub fn move_actor(&mut self, id: &str, position: Vec3, rotation: Rotation, input_sequence: Option<u64>) -> bool {
        self.actors
            .update_position(id, position, rotation, input_sequence, &self.world)
    }

    /// Fires along the actor's view direction.
    ///
    /// Returns the new bullet, or `None` if the actor is unknown, dead or
    /// still cooling down.
    pub fn shoot(&mut self, id: &str, now_ms: u64) -> Option<Bullet> {
        let cooldown = self.config.combat.shoot_cooldown_ms;
        let muzzle = self.config.combat.muzzle_height;
        let actor = self
            .actors
            .get_mut(id)
            .filter(|a| a.is_alive() && a.can_shoot(now_ms, cooldown))?;
        actor.last_shot_ms = Some(now_ms);
        let origin = actor.position.raised(muzzle);
        let direction = actor.rotation.forward();
        let owner = actor.id.clone();
        Some(self.projectiles.fire(&owner, origin, direction, 1.0, 1.0).clone())
    }

    /// Explicit respawn request. Only valid while dead.
    pub fn respawn(&mut self, id: &str) -> bool {
        self.actors.respawn(id, &self.world, &mut self.rng)
    }

    /// Kills an actor on behalf of an operator. Nobody scores.
    pub fn admin_kill(&mut self, id: &str, now_ms: u64) -> Option<KillRecord> {
        self.kill(id, Some(ADMIN_KILLER_ID), Some(ADMIN_KILLER_NAME), now_ms)
    }

    /// Kills an actor. See [`ActorStore::kill`].
    pub fn kill(
        &mut self,
        victim_id: &str,
        killer_id: Option<&str>,
        killer_name: Option<&str>,
        now_ms: u64,
    ) -> Option<KillRecord> {
        self.actors
            .kill(victim_id, killer_id, killer_name, &mut self.kills, now_ms)
    }

    /// Runs one fixed step.
    pub fn step(&mut self, now_ms: u64) -> StepReport {
        let mut report = StepReport {
            tick: self.tick,
            ..StepReport::default()
        };

        self.run_bots(now_ms, &mut report);

        let projectiles = self
            .projectiles
            .tick(&mut self.actors, &self.world, &mut self.kills, now_ms);
        report.hits = projectiles.hits;
        report.kills = projectiles.kills;

        if let Some(delay) = self.config.respawn.delay_ms() {
            report.respawned = self.actors.respawn_due(delay, &self.world, &mut self.rng, now_ms);
        }

        if self.kills.rotate_if_due(now_ms) {
            debug!(tick = self.tick, "kill list rotated");
        }
        self.tick += 1;
        report
    }

    fn run_bots(&mut self, now_ms: u64, report: &mut StepReport) {
        let ids: Vec<ActorId> = self.bots.keys().cloned().collect();
        for id in ids {
            let Some(bot) = self.actors.get(id.as_str()).filter(|a| a.is_alive()) else {
                continue;
            };
            let Some(state) = self.bots.get_mut(&id) else {
                continue;
            };
            let settings = *self.bot_settings.get(state.archetype);
            let perception = Perception::gather(
                bot,
                &self.actors,
                self.projectiles.bullets(),
                &self.world,
                settings.dodge_distance,
            );
            let ctx = BotContext {
                world: &self.world,
                actors: &self.actors,
                now_ms,
            };
            let intent = decide(bot, state, &settings, &perception, ctx, &mut self.rng);

            match intent.movement {
                Movement::Stay => {}
                Movement::Walk { dx, dz } => self.actors.walk(id.as_str(), dx, dz, settings.move_speed, &self.world),
                Movement::Teleport(spot) => self.actors.teleport(id.as_str(), spot),
            }
            if let Some(target) = intent.shoot_at {
                report.fired.extend(self.bot_shoot(&id, &target, &settings, now_ms));
            }
        }
    }

    /// Turns the bot towards `target` and fires if in range and off cooldown.
    fn bot_shoot(&mut self, id: &ActorId, target: &ActorId, settings: &BotSettings, now_ms: u64) -> Option<Bullet> {
        let target = self.actors.get(target.as_str())?.clone();
        let muzzle = self.config.combat.muzzle_height;
        let bot = self.actors.get_mut(id.as_str())?;
        let (direction, planar) = aim(bot, &target);
        bot.rotation = Rotation::looking_along(direction);

        if planar > settings.shoot_distance || !bot.can_shoot(now_ms, settings.shoot_cooldown_ms) {
            return None;
        }
        bot.last_shot_ms = Some(now_ms);
        let origin = bot.position.raised(muzzle);
        Some(
            self.projectiles
                .fire(
                    id,
                    origin,
                    direction,
                    settings.bullet_speed_multiplier,
                    settings.bullet_damage_multiplier,
                )
                .clone(),
        )
    }
}
