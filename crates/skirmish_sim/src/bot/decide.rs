//! One decision function per archetype, dispatched by [`decide`].

use super::perception::{Perception, Threat};
use super::{BotArchetype, BotSettings, BotState};
use crate::actor::{Actor, ActorId, ActorStore};
use rand::Rng;
use skirmish_shared::Vec3;
use skirmish_world::CollisionIndex;
use std::f32::consts::TAU;

/// Intents smaller than this on both axes mean "stand still".
const MIN_INTENT: f32 = 0.001;
/// Beyond this distance a simple bot closes in while strafing.
const STRAFE_APPROACH_DISTANCE: f32 = 16.0;
/// Shooter eye height used when scoring cover.
const SHOOTER_EYE_HEIGHT: f32 = 1.2;
/// Height of the point that must be hidden when scoring cover.
const COVER_EYE_HEIGHT: f32 = 1.1;

/// Shared, read-only state a decision may look at.
#[derive(Clone, Copy)]
pub struct BotContext<'a> {
    /// Arena geometry.
    pub world: &'a CollisionIndex,
    /// Every actor, the deciding bot included.
    pub actors: &'a ActorStore,
    /// Simulation time.
    pub now_ms: u64,
}

/// How a bot wants to move this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Movement {
    /// Do nothing.
    Stay,
    /// Walk one step along an XZ direction (any length).
    Walk {
        /// X component.
        dx: f32,
        /// Z component.
        dz: f32,
    },
    /// Jump to an already collision-checked spot.
    Teleport(Vec3),
}

impl Movement {
    fn walk((dx, dz): (f32, f32)) -> Self {
        if dx.abs() > MIN_INTENT || dz.abs() > MIN_INTENT {
            Self::Walk { dx, dz }
        } else {
            Self::Stay
        }
    }
}

/// A bot's decision for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct BotIntent {
    /// Movement to apply first.
    pub movement: Movement,
    /// Actor to aim at (and shoot if in range) after moving.
    pub shoot_at: Option<ActorId>,
}

/// Decides what `bot` does this tick.
///
/// Only `state` (the bot's scratch memory) is written; positions and
/// bullets are left to the caller.
pub fn decide<R: Rng + ?Sized>(
    bot: &Actor,
    state: &mut BotState,
    settings: &BotSettings,
    perception: &Perception<'_>,
    ctx: BotContext<'_>,
    rng: &mut R,
) -> BotIntent {
    match state.archetype {
        BotArchetype::Dumb => dumb(bot, perception, ctx.now_ms),
        BotArchetype::Simple => simple(bot, state, perception, ctx.now_ms, rng),
        BotArchetype::Seeking => seeking(bot, settings, perception, ctx),
        BotArchetype::Teleporting => teleporting(bot, state, settings, perception, ctx),
        BotArchetype::Danger => danger(bot, settings, perception, ctx),
        BotArchetype::Monsters => monsters(bot, perception),
    }
}

fn target_id(target: Option<&Actor>) -> Option<ActorId> {
    target.map(|t| t.id.clone())
}

/// Unit XZ direction from `bot` to `target` and the planar distance.
fn toward(bot: &Actor, target: &Actor) -> (f32, f32, f32) {
    let dx = target.position.x - bot.position.x;
    let dz = target.position.z - bot.position.z;
    let length = (dx * dx + dz * dz).sqrt();
    let length = if length > 0.0 { length } else { 1.0 };
    (dx / length, dz / length, length)
}

/// Approach `target` while drifting sideways by `strafe`.
fn approach_strafing(bot: &Actor, target: &Actor, strafe: f32) -> (f32, f32) {
    let (tx, tz, _) = toward(bot, target);
    (tx - tz * strafe, tz + tx * strafe)
}

fn dumb(bot: &Actor, perception: &Perception<'_>, now_ms: u64) -> BotIntent {
    let movement = match perception.visible.or(perception.nearest) {
        Some(target) => {
            let (dx, dz, _) = toward(bot, target);
            Movement::walk((dx, dz))
        }
        None => {
            // Slow circle, phase-shifted per bot so they don't march in step.
            let phase = (bot.id.as_str().len() % 5) as f64 * 0.45;
            let angle = now_ms as f64 * 0.000_75 + phase;
            Movement::walk((angle.cos() as f32, angle.sin() as f32))
        }
    };
    BotIntent {
        movement,
        shoot_at: target_id(perception.visible),
    }
}

fn simple<R: Rng + ?Sized>(
    bot: &Actor,
    state: &mut BotState,
    perception: &Perception<'_>,
    now_ms: u64,
    rng: &mut R,
) -> BotIntent {
    let movement = if let Some(threat) = &perception.threat {
        Movement::walk(threat.dodge())
    } else if let Some(target) = perception.visible {
        let (tx, tz, distance) = toward(bot, target);
        let (sx, sz) = (-tz, tx);
        let strafe = ((now_ms as f64 * 0.004 + bot.id.as_str().len() as f64).sin() * 0.55) as f32;
        if distance > STRAFE_APPROACH_DISTANCE {
            Movement::walk((tx + sx * strafe, tz + sz * strafe))
        } else {
            let side = if strafe < 0.0 { -1.0 } else { 1.0 };
            Movement::walk((sx * side, sz * side))
        }
    } else {
        if now_ms >= state.next_wander_change_at {
            let angle = rng.gen::<f32>() * TAU;
            state.wander_direction = (angle.cos(), angle.sin());
            state.next_wander_change_at = now_ms + 1200 + rng.gen_range(0..1500);
        }
        Movement::walk(state.wander_direction)
    };
    BotIntent {
        movement,
        shoot_at: target_id(perception.visible),
    }
}

fn seeking(bot: &Actor, settings: &BotSettings, perception: &Perception<'_>, ctx: BotContext<'_>) -> BotIntent {
    let target = perception.nearest;
    let mut movement = perception
        .threat
        .as_ref()
        .map_or(Movement::Stay, |threat| Movement::walk(cover_direction(bot, threat, settings.cover_distance, ctx)));
    if movement == Movement::Stay {
        if let Some(target) = target {
            let (dx, dz, _) = toward(bot, target);
            movement = Movement::walk((dx, dz));
        }
    }
    BotIntent {
        movement,
        shoot_at: target_id(target),
    }
}

fn teleporting(
    bot: &Actor,
    state: &mut BotState,
    settings: &BotSettings,
    perception: &Perception<'_>,
    ctx: BotContext<'_>,
) -> BotIntent {
    let target = perception.nearest.or(perception.visible);
    let landing = perception
        .threat
        .as_ref()
        .and_then(|threat| escape_landing(bot, threat, state, settings, ctx))
        .or_else(|| target.and_then(|target| flank_landing(bot, target, state, settings, ctx)));

    let movement = match (landing, target) {
        (Some(spot), _) => {
            state.last_teleport_at = ctx.now_ms;
            Movement::Teleport(spot)
        }
        (None, Some(target)) => Movement::walk(approach_strafing(bot, target, 0.5)),
        (None, None) => Movement::Stay,
    };
    BotIntent {
        movement,
        shoot_at: target_id(target),
    }
}

fn danger(bot: &Actor, settings: &BotSettings, perception: &Perception<'_>, ctx: BotContext<'_>) -> BotIntent {
    let target = perception.nearest.or(perception.weakest).or(perception.visible);
    let movement = match (&perception.threat, target) {
        (Some(threat), _) => Movement::walk(cover_direction(bot, threat, settings.cover_distance, ctx)),
        (None, Some(target)) => Movement::walk(approach_strafing(bot, target, 0.45)),
        (None, None) => Movement::Stay,
    };
    BotIntent {
        movement,
        shoot_at: target_id(target),
    }
}

fn monsters(bot: &Actor, perception: &Perception<'_>) -> BotIntent {
    let target = perception.nearest.or(perception.weakest).or(perception.visible);
    let movement = target.map_or(Movement::Stay, |target| {
        let (mut dx, mut dz, _) = toward(bot, target);
        if let Some(threat) = &perception.threat {
            let (sx, sz) = threat.dodge();
            dx += sx * 0.25;
            dz += sz * 0.25;
        }
        Movement::walk((dx, dz))
    });
    BotIntent {
        movement,
        shoot_at: target_id(target),
    }
}

/// Best of four escape directions: sideways either way, back along the
/// bullet, or forward along it. Spots out of the shooter's sight score
/// highest, then distance from the shooter breaks ties. Falls back to the
/// plain dodge.
fn cover_direction(bot: &Actor, threat: &Threat, cover_distance: f32, ctx: BotContext<'_>) -> (f32, f32) {
    let dodge = threat.dodge();
    let Some(shooter) = ctx.actors.get(threat.shooter.as_str()) else {
        return dodge;
    };
    let (hx, hz) = threat.heading;
    let candidates = [dodge, (-dodge.0, -dodge.1), (-hx, -hz), (hx, hz)];
    let shooter_eye = shooter.position.raised(SHOOTER_EYE_HEIGHT);

    let mut best = dodge;
    let mut best_score = f32::NEG_INFINITY;
    for (cx, cz) in candidates {
        let length = (cx * cx + cz * cz).sqrt();
        let (nx, nz) = if length > 0.0 { (cx / length, cz / length) } else { (cx, cz) };
        let x = bot.position.x + nx * cover_distance;
        let z = bot.position.z + nz * cover_distance;
        let spot = Vec3::new(x, ctx.world.terrain_height_at(x, z, bot.position.y), z);
        if !ctx.world.is_free_for_actor(spot) {
            continue;
        }
        let hidden = !ctx.world.has_line_of_sight(shooter_eye, spot.raised(COVER_EYE_HEIGHT));
        let score = (if hidden { 6.0 } else { 0.0 }) + spot.planar_distance(shooter.position) * 0.12;
        if score > best_score {
            best_score = score;
            best = (nx, nz);
        }
    }
    best
}

/// First free, in-bounds spot among `candidates`.
fn first_free_landing(candidates: &[(f32, f32)], from_y: f32, world: &CollisionIndex) -> Option<Vec3> {
    let limit = world.half_size() - 1.0;
    candidates
        .iter()
        .filter(|(x, z)| x.abs() <= limit && z.abs() <= limit)
        .map(|&(x, z)| Vec3::new(x, world.terrain_height_at(x, z, from_y), z))
        .find(|spot| world.is_free_for_actor(*spot))
}

/// Evasive jump sideways (either way) or back along the bullet's path.
fn escape_landing(
    bot: &Actor,
    threat: &Threat,
    state: &BotState,
    settings: &BotSettings,
    ctx: BotContext<'_>,
) -> Option<Vec3> {
    if ctx.now_ms.saturating_sub(state.last_teleport_at) < settings.escape_cooldown_ms() {
        return None;
    }
    let away = settings.escape_distance();
    let (dx, dz) = threat.dodge();
    let (hx, hz) = threat.heading;
    let p = bot.position;
    let candidates = [
        (p.x + dx * away, p.z + dz * away),
        (p.x - dx * away, p.z - dz * away),
        (p.x - hx * (away + 2.0), p.z - hz * (away + 2.0)),
    ];
    first_free_landing(&candidates, p.y, ctx.world)
}

/// Aggressive jump behind `target`, or slightly to either side of that.
fn flank_landing(
    bot: &Actor,
    target: &Actor,
    state: &BotState,
    settings: &BotSettings,
    ctx: BotContext<'_>,
) -> Option<Vec3> {
    if ctx.now_ms.saturating_sub(state.last_teleport_at) < settings.flank_cooldown_ms() {
        return None;
    }
    let yaw = target.rotation.yaw;
    let (fx, fz) = (-yaw.sin(), -yaw.cos());
    let (rx, rz) = (-fz, fx);
    let behind = settings.flank_distance();
    let further = behind + 1.4;
    let t = target.position;
    let candidates = [
        (t.x - fx * behind, t.z - fz * behind),
        (t.x - fx * further + rx * 1.6, t.z - fz * further + rz * 1.6),
        (t.x - fx * further - rx * 1.6, t.z - fz * further - rz * 1.6),
    ];
    first_free_landing(&candidates, bot.position.y, ctx.world)
}

/// Aim from a bot's chest to a target's chest.
#[must_use]
pub fn aim(bot: &Actor, target: &Actor) -> (Vec3, f32) {
    let offset = target.position.raised(1.0) - bot.position.raised(1.0);
    let planar = (offset.x * offset.x + offset.z * offset.z).sqrt();
    (offset.normalize_or(Vec3::X), planar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorKind;
    use crate::projectile::Bullet;
    use skirmish_shared::Rotation;
    use skirmish_world::{StreetGrid, WorldLayout, WorldSeed, SIMULATION_STREAM};

    fn open_world() -> CollisionIndex {
        let layout = WorldLayout {
            generated_at: 0,
            seed: 0,
            half_size: 100.0,
            streets: StreetGrid::default(),
            walls: Vec::new(),
            buildings: Vec::new(),
            second_floors: Vec::new(),
            upper_walls: Vec::new(),
            ramps: Vec::new(),
        };
        CollisionIndex::build(&layout, 1.0, 1.0, 1.8)
    }

    fn store(world: &CollisionIndex, placed: &[(&str, f32, f32)]) -> ActorStore {
        let mut rng = WorldSeed::new(5).rng(SIMULATION_STREAM);
        let mut store = ActorStore::new(100.0);
        for (id, x, z) in placed {
            store.add((*id).into(), Some(id), ActorKind::Player, world, &mut rng);
            store.teleport(id, Vec3::new(*x, 1.0, *z));
        }
        store
    }

    fn run(
        archetype: BotArchetype,
        state: &mut BotState,
        actors: &ActorStore,
        bullets: &[Bullet],
        world: &CollisionIndex,
        now_ms: u64,
    ) -> BotIntent {
        let bot = actors.get("bot").unwrap();
        let settings = BotSettings::defaults(archetype);
        let perception = Perception::gather(bot, actors, bullets, world, settings.dodge_distance);
        let ctx = BotContext { world, actors, now_ms };
        let mut rng = WorldSeed::new(9).rng(SIMULATION_STREAM);
        decide(bot, state, &settings, &perception, ctx, &mut rng)
    }

    fn heading(movement: Movement) -> f32 {
        match movement {
            Movement::Walk { dx, dz } => dz.atan2(dx),
            other => panic!("expected a walk, got {other:?}"),
        }
    }

    #[test]
    fn test_dumb_wander_is_continuous() {
        let world = open_world();
        let actors = store(&world, &[("bot", 0.0, 0.0), ("far", 90.0, 90.0)]);
        let mut state = BotState::new(BotArchetype::Dumb);
        let mut previous = heading(run(BotArchetype::Dumb, &mut state, &actors, &[], &world, 1_000).movement);
        for step in 1..200 {
            let now = 1_000 + step * 16;
            let current = heading(run(BotArchetype::Dumb, &mut state, &actors, &[], &world, now).movement);
            let delta = (current - previous).sin().abs();
            assert!(delta < 0.05, "heading jumped by {delta} at {now}");
            previous = current;
        }
    }

    #[test]
    fn test_dumb_chases_visible_target() {
        let world = open_world();
        let actors = store(&world, &[("bot", 0.0, 0.0), ("prey", 10.0, 0.0)]);
        let mut state = BotState::new(BotArchetype::Dumb);
        let intent = run(BotArchetype::Dumb, &mut state, &actors, &[], &world, 0);
        assert_eq!(intent.shoot_at.as_ref().map(ActorId::as_str), Some("prey"));
        match intent.movement {
            Movement::Walk { dx, dz } => assert!((dx - 1.0).abs() < 1e-5 && dz.abs() < 1e-5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_simple_dodges_sideways() {
        let world = open_world();
        let actors = store(&world, &[("bot", 0.0, 0.0), ("shooter", -30.0, 0.0)]);
        let bullet = Bullet {
            id: "shooter-0".into(),
            owner: "shooter".into(),
            position: Vec3::new(-4.0, 1.6, 0.0),
            direction: Vec3::X,
            speed: 1.0,
            damage: 25.0,
            age: 0,
            max_age: 300,
        };
        let mut state = BotState::new(BotArchetype::Simple);
        let intent = run(BotArchetype::Simple, &mut state, &actors, &[bullet], &world, 0);
        match intent.movement {
            Movement::Walk { dx, dz } => assert!(dx.abs() < 1e-5 && (dz.abs() - 1.0).abs() < 1e-5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_simple_wander_rerolls_on_schedule() {
        let world = open_world();
        let actors = store(&world, &[("bot", 0.0, 0.0)]);
        let mut state = BotState::new(BotArchetype::Simple);
        run(BotArchetype::Simple, &mut state, &actors, &[], &world, 5_000);
        let next = state.next_wander_change_at;
        assert!((6_200..7_700).contains(&next));
        let direction = state.wander_direction;
        run(BotArchetype::Simple, &mut state, &actors, &[], &world, 5_500);
        assert_eq!(state.wander_direction, direction);
        assert_eq!(state.next_wander_change_at, next);
    }

    #[test]
    fn test_teleporting_flanks_then_cools_down() {
        let world = open_world();
        let mut actors = store(&world, &[("bot", 0.0, 0.0), ("prey", 20.0, 0.0)]);
        actors.get_mut("prey").unwrap().rotation = Rotation::new(0.0, 0.0);
        let mut state = BotState::new(BotArchetype::Teleporting);

        let intent = run(BotArchetype::Teleporting, &mut state, &actors, &[], &world, 10_000);
        match intent.movement {
            // Prey faces -Z, so behind it is +Z.
            Movement::Teleport(spot) => {
                assert!((spot.x - 20.0).abs() < 1e-4);
                assert!((spot.z - 6.4).abs() < 1e-4);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(state.last_teleport_at, 10_000);

        let again = run(BotArchetype::Teleporting, &mut state, &actors, &[], &world, 10_100);
        assert!(matches!(again.movement, Movement::Walk { .. }));
    }

    #[test]
    fn test_monsters_without_target_stay() {
        let world = open_world();
        let actors = store(&world, &[("bot", 0.0, 0.0)]);
        let mut state = BotState::new(BotArchetype::Monsters);
        let intent = run(BotArchetype::Monsters, &mut state, &actors, &[], &world, 0);
        assert_eq!(intent.movement, Movement::Stay);
        assert!(intent.shoot_at.is_none());
    }

    #[test]
    fn test_aim_points_at_chest() {
        let world = open_world();
        let actors = store(&world, &[("bot", 0.0, 0.0), ("prey", 0.0, -10.0)]);
        let (direction, planar) = aim(actors.get("bot").unwrap(), actors.get("prey").unwrap());
        assert!((planar - 10.0).abs() < 1e-5);
        assert!((direction.z + 1.0).abs() < 1e-5);
    }
}
