//! # State Snapshots
//!
//! What clients see of the simulation: every actor, the most recent bullets
//! and the most recent kills, with coordinates rounded to keep payloads
//! small. The debug channel gets the same view uncapped plus the layout.

use serde::{Deserialize, Serialize};
use skirmish_shared::math::round_to;
use skirmish_shared::{Rotation, Vec3};
use skirmish_sim::{Actor, BotArchetype, Bullet, GameConfig, KillRecord, Simulation};
use skirmish_world::WorldLayout;

/// An actor as clients see it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    /// Actor id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Rounded feet position.
    pub position: Vec3,
    /// Rounded view rotation.
    pub rotation: Rotation,
    /// Packed `0xRRGGBB`.
    pub color: u32,
    /// Current health.
    pub health: f32,
    /// Current score.
    pub score: u32,
    /// `false` while dead.
    pub is_alive: bool,
    /// Bot or player.
    pub is_bot: bool,
    /// Archetype, for bots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_type: Option<BotArchetype>,
    /// Time of death, while dead.
    #[serde(default)]
    pub death_time: Option<u64>,
    /// Who killed this actor last, while dead.
    #[serde(default)]
    pub last_killer_name: Option<String>,
    /// Input sequence of the last applied move.
    pub last_input_sequence: u64,
}

impl ActorView {
    /// Snapshot of `actor` rounded to `precision` decimals.
    #[must_use]
    pub fn of(actor: &Actor, precision: u32) -> Self {
        Self {
            id: actor.id.to_string(),
            name: actor.name.clone(),
            position: actor.position.rounded(precision),
            rotation: actor.rotation.rounded(precision),
            color: actor.color,
            health: actor.health,
            score: actor.score,
            is_alive: actor.is_alive(),
            is_bot: actor.is_bot(),
            bot_type: actor.archetype,
            death_time: actor.death_time,
            last_killer_name: actor.last_killer_name.clone(),
            last_input_sequence: actor.last_input_sequence,
        }
    }
}

/// A bullet as clients see it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletView {
    /// Bullet id.
    pub id: String,
    /// Shooter id.
    pub player_id: String,
    /// Rounded position.
    pub position: Vec3,
    /// Rounded direction.
    pub direction: Vec3,
    /// Distance per tick.
    pub speed: f32,
    /// Ticks lived.
    pub age: u32,
    /// Ticks before expiry.
    pub max_age: u32,
}

impl BulletView {
    /// Snapshot of `bullet` rounded to `precision` decimals.
    #[must_use]
    pub fn of(bullet: &Bullet, precision: u32) -> Self {
        Self {
            id: bullet.id.clone(),
            player_id: bullet.owner.to_string(),
            position: bullet.position.rounded(precision),
            direction: bullet.direction.rounded(precision),
            speed: round_to(bullet.speed, precision),
            age: bullet.age,
            max_age: bullet.max_age,
        }
    }
}

/// How much of the simulation a snapshot carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotLimits {
    /// Decimal places; zero keeps full precision.
    pub precision: u32,
    /// Most recent bullets kept; `None` keeps all.
    pub max_bullets: Option<usize>,
    /// Most recent kills kept; `None` keeps all.
    pub max_kills: Option<usize>,
    /// Attach the world layout.
    pub include_world: bool,
}

impl SnapshotLimits {
    /// Limits for the regular `gameState` broadcast.
    #[must_use]
    pub fn broadcast(config: &GameConfig) -> Self {
        let network = &config.network;
        Self {
            precision: network.snapshot_precision,
            max_bullets: (network.max_bullets_per_state > 0).then_some(network.max_bullets_per_state),
            max_kills: Some(network.max_kills_per_state),
            include_world: false,
        }
    }

    /// Limits for the debug channel: nothing dropped, world attached.
    #[must_use]
    pub fn debug(config: &GameConfig) -> Self {
        Self {
            precision: config.network.snapshot_precision,
            max_bullets: None,
            max_kills: None,
            include_world: true,
        }
    }
}

/// The `state` payload of `gameState` and `debugState`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Every actor, bots included.
    pub players: Vec<ActorView>,
    /// The most recent bullets.
    pub bullets: Vec<BulletView>,
    /// The most recent kills, oldest first.
    pub kills: Vec<KillRecord>,
    /// Server wall clock (ms).
    pub timestamp: u64,
    /// Present on the debug channel only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_layout: Option<WorldLayout>,
}

impl StateSnapshot {
    /// Captures `simulation` under `limits`.
    #[must_use]
    pub fn capture(simulation: &Simulation, limits: SnapshotLimits, now_ms: u64) -> Self {
        let bullets = tail(simulation.bullets(), limits.max_bullets);
        let kills = tail(simulation.kills().all(), limits.max_kills);
        Self {
            players: simulation
                .actors()
                .iter()
                .map(|actor| ActorView::of(actor, limits.precision))
                .collect(),
            bullets: bullets
                .iter()
                .map(|bullet| BulletView::of(bullet, limits.precision))
                .collect(),
            kills: kills.to_vec(),
            timestamp: now_ms,
            world_layout: limits.include_world.then(|| simulation.layout().as_ref().clone()),
        }
    }

    /// The view of actor `id`, if present.
    #[must_use]
    pub fn player(&self, id: &str) -> Option<&ActorView> {
        self.players.iter().find(|player| player.id == id)
    }
}

/// The last `limit` items of `items`.
fn tail<T>(items: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(limit) => &items[items.len().saturating_sub(limit)..],
        None => items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_most_recent() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(tail(&items, Some(2)), &[4, 5]);
        assert_eq!(tail(&items, Some(0)), &[] as &[i32]);
        assert_eq!(tail(&items, Some(10)), &items);
        assert_eq!(tail(&items, None), &items);
    }

    #[test]
    fn test_broadcast_limits_follow_config() {
        let mut config = GameConfig::default();
        config.network.max_bullets_per_state = 0;
        config.network.max_kills_per_state = 5;
        let limits = SnapshotLimits::broadcast(&config);
        assert_eq!(limits.max_bullets, None);
        assert_eq!(limits.max_kills, Some(5));
        assert!(!limits.include_world);
        assert!(SnapshotLimits::debug(&config).include_world);
    }
}
