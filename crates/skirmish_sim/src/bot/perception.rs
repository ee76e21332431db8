//! What a bot knows at the start of its turn.

use crate::actor::{Actor, ActorId, ActorStore};
use crate::projectile::Bullet;
use skirmish_world::CollisionIndex;

/// Range for targets the bot can see.
pub const VISIBLE_RANGE: f32 = 60.0;
/// Range for targets regardless of sight.
pub const TARGET_RANGE: f32 = 70.0;
/// Sight line starts this far above the bot's feet.
pub const EYE_HEIGHT: f32 = 1.25;
/// Sight line ends this far above the target's feet.
pub const TORSO_HEIGHT: f32 = 1.0;

/// Bullets further ahead than this along their path are ignored.
const THREAT_WINDOW: f32 = 9.0;
/// Bullets passing further to the side than this are ignored.
const THREAT_CORRIDOR: f32 = 2.4;

/// The most dangerous bullet heading for a bot.
#[derive(Clone, Debug, PartialEq)]
pub struct Threat {
    /// Who fired it.
    pub shooter: ActorId,
    /// Bullet heading in the XZ plane (unit length).
    pub heading: (f32, f32),
    /// Bot position relative to the bullet in the XZ plane.
    pub offset: (f32, f32),
    /// Closer and more central is higher.
    pub score: f32,
}

impl Threat {
    /// Unit vector perpendicular to the bullet, on the side the bot already is.
    #[must_use]
    pub fn dodge(&self) -> (f32, f32) {
        let (hx, hz) = self.heading;
        let (rx, rz) = (-hz, hx);
        let side = if self.offset.0 * rx + self.offset.1 * rz >= 0.0 { 1.0 } else { -1.0 };
        (rx * side, rz * side)
    }
}

/// Targets and threats around one bot.
#[derive(Clone, Debug, Default)]
pub struct Perception<'a> {
    /// Nearest live actor in sight within [`VISIBLE_RANGE`].
    pub visible: Option<&'a Actor>,
    /// Nearest live actor within [`TARGET_RANGE`].
    pub nearest: Option<&'a Actor>,
    /// Weakest live actor within [`TARGET_RANGE`], nearest on ties.
    pub weakest: Option<&'a Actor>,
    /// Worst incoming bullet.
    pub threat: Option<Threat>,
}

impl<'a> Perception<'a> {
    /// Looks around `bot`. Bullets within `dodge_distance` may be threats.
    #[must_use]
    pub fn gather(
        bot: &Actor,
        actors: &'a ActorStore,
        bullets: &[Bullet],
        world: &CollisionIndex,
        dodge_distance: f32,
    ) -> Self {
        Self {
            visible: nearest_target(bot, actors, VISIBLE_RANGE, Some(world)),
            nearest: nearest_target(bot, actors, TARGET_RANGE, None),
            weakest: weakest_target(bot, actors, TARGET_RANGE),
            threat: incoming_threat(bot, bullets, dodge_distance),
        }
    }
}

/// Nearest live actor by planar distance, optionally requiring line of sight.
/// Later actors win ties.
fn nearest_target<'a>(
    bot: &Actor,
    actors: &'a ActorStore,
    max_distance: f32,
    sight: Option<&CollisionIndex>,
) -> Option<&'a Actor> {
    let eye = bot.position.raised(EYE_HEIGHT);
    let mut best = None;
    let mut best_distance = max_distance;
    for candidate in actors.alive().filter(|a| a.id != bot.id) {
        let distance = bot.position.planar_distance(candidate.position);
        if distance > best_distance {
            continue;
        }
        if let Some(world) = sight {
            if !world.has_line_of_sight(eye, candidate.position.raised(TORSO_HEIGHT)) {
                continue;
            }
        }
        best = Some(candidate);
        best_distance = distance;
    }
    best
}

fn weakest_target<'a>(bot: &Actor, actors: &'a ActorStore, max_distance: f32) -> Option<&'a Actor> {
    let mut best: Option<&Actor> = None;
    let mut best_health = f32::INFINITY;
    let mut best_distance = max_distance;
    for candidate in actors.alive().filter(|a| a.id != bot.id) {
        let distance = bot.position.planar_distance(candidate.position);
        if distance > max_distance {
            continue;
        }
        let weaker = candidate.health < best_health;
        let as_weak_but_closer = (candidate.health - best_health).abs() < f32::EPSILON && distance < best_distance;
        if weaker || as_weak_but_closer {
            best = Some(candidate);
            best_health = candidate.health;
            best_distance = distance;
        }
    }
    best
}

fn incoming_threat(bot: &Actor, bullets: &[Bullet], detection_distance: f32) -> Option<Threat> {
    let mut worst: Option<Threat> = None;
    for bullet in bullets.iter().filter(|b| b.owner != bot.id) {
        let rel_x = bot.position.x - bullet.position.x;
        let rel_z = bot.position.z - bullet.position.z;
        if (rel_x * rel_x + rel_z * rel_z).sqrt() > detection_distance {
            continue;
        }

        let length = (bullet.direction.x * bullet.direction.x + bullet.direction.z * bullet.direction.z).sqrt();
        let length = if length > 0.0 { length } else { 1.0 };
        let (hx, hz) = (bullet.direction.x / length, bullet.direction.z / length);

        let forward = rel_x * hx + rel_z * hz;
        if forward <= 0.0 || forward > THREAT_WINDOW {
            continue;
        }
        let lateral = (rel_x * -hz + rel_z * hx).abs();
        if lateral > THREAT_CORRIDOR {
            continue;
        }

        let score = (THREAT_WINDOW + 1.0 - forward) + (THREAT_CORRIDOR - lateral);
        if worst.as_ref().map_or(true, |w| score > w.score) {
            worst = Some(Threat {
                shooter: bullet.owner.clone(),
                heading: (hx, hz),
                offset: (rel_x, rel_z),
                score,
            });
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_shared::Vec3;

    fn bullet(owner: &str, position: Vec3, direction: Vec3) -> Bullet {
        Bullet {
            id: format!("{owner}-0"),
            owner: owner.into(),
            position,
            direction,
            speed: 1.0,
            damage: 25.0,
            age: 0,
            max_age: 300,
        }
    }

    fn bot_at(x: f32, z: f32) -> Actor {
        Actor {
            id: "bot".into(),
            name: "bot".into(),
            color: 0,
            position: Vec3::new(x, 1.0, z),
            rotation: skirmish_shared::Rotation::default(),
            health: 100.0,
            score: 0,
            archetype: None,
            death_time: None,
            last_killer_name: None,
            last_shot_ms: None,
            last_input_sequence: 0,
        }
    }

    #[test]
    fn test_threat_window() {
        let bot = bot_at(0.0, 0.0);
        // Coming straight at the bot from 5 units away.
        let incoming = bullet("x", Vec3::new(-5.0, 1.6, 0.0), Vec3::X);
        let threat = incoming_threat(&bot, &[incoming], 14.0).unwrap();
        assert_eq!(threat.shooter.as_str(), "x");
        assert!((threat.score - 7.4).abs() < 1e-4);

        // Already past the bot.
        let past = bullet("x", Vec3::new(1.0, 1.6, 0.0), Vec3::X);
        assert!(incoming_threat(&bot, &[past], 14.0).is_none());

        // Too far to the side.
        let wide = bullet("x", Vec3::new(-5.0, 1.6, 3.0), Vec3::X);
        assert!(incoming_threat(&bot, &[wide], 14.0).is_none());

        // Own bullets are never threats.
        let own = bullet("bot", Vec3::new(-5.0, 1.6, 0.0), Vec3::X);
        assert!(incoming_threat(&bot, &[own], 14.0).is_none());
    }

    #[test]
    fn test_dodge_keeps_current_side() {
        let bot = bot_at(0.0, 1.0);
        let incoming = bullet("x", Vec3::new(-5.0, 1.6, 0.0), Vec3::X);
        let threat = incoming_threat(&bot, &[incoming], 14.0).unwrap();
        let (dx, dz) = threat.dodge();
        assert!(dx.abs() < 1e-6);
        assert!((dz - 1.0).abs() < 1e-6);
    }
}
