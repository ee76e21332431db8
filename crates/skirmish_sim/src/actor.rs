//! # Actor Store
//!
//! Players and bots share one record type and one ordered map. The store
//! owns the lifecycle:
//!
//! ```text
//!   add ──> ALIVE ──(health <= 0 / kill)──> DEAD ──(respawn)──> ALIVE
//!             │                               │
//!             └────────────(remove)───────────┘
//! ```
//!
//! Dead actors ignore movement, are never hit and are never targeted.
//! Geometry and randomness are passed in by the caller.

use crate::bot::BotArchetype;
use crate::kills::{KillBook, KillRecord, GAME_KILLER_ID, GAME_KILLER_NAME};
use crate::names;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use skirmish_shared::{Rotation, Vec3};
use skirmish_world::CollisionIndex;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use tracing::info;

/// Colors handed to players, first free one wins.
pub const PLAYER_COLORS: [u32; 8] = [
    0xFF8800, 0x00CCFF, 0xFF33AA, 0x33FF88, 0xFFCC00, 0xAA66FF, 0x66FFEE, 0xFF6666,
];

/// Score awarded to the killer.
pub const KILL_SCORE: u32 = 10;

/// Stable, opaque actor id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Wraps an id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ActorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a new actor is controlled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorKind {
    /// A connected client.
    Player,
    /// A server-driven bot with its display color.
    Bot {
        /// Behaviour profile.
        archetype: BotArchetype,
        /// Display color.
        color: u32,
    },
}

/// A player or bot.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    /// Stable id.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Packed `0xRRGGBB`.
    pub color: u32,
    /// Feet position.
    pub position: Vec3,
    /// View rotation.
    pub rotation: Rotation,
    /// `0..=max_health`.
    pub health: f32,
    /// Kills times [`KILL_SCORE`].
    pub score: u32,
    /// Set for bots.
    pub archetype: Option<BotArchetype>,
    /// When the actor died, while dead.
    pub death_time: Option<u64>,
    /// Who got the last kill on this actor, while dead.
    pub last_killer_name: Option<String>,
    /// Last accepted shot.
    pub last_shot_ms: Option<u64>,
    /// Input sequence of the last applied move.
    pub last_input_sequence: u64,
}

impl Actor {
    /// `true` unless dead.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.death_time.is_none()
    }

    /// `true` for bots.
    #[inline]
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.archetype.is_some()
    }

    /// `true` if `cooldown_ms` has passed since the last shot.
    #[must_use]
    pub fn can_shoot(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        self.last_shot_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= cooldown_ms)
    }
}

/// Owner of every actor record.
#[derive(Clone, Debug)]
pub struct ActorStore {
    actors: BTreeMap<ActorId, Actor>,
    max_health: f32,
}

impl ActorStore {
    /// Empty store; actors spawn with `max_health`.
    #[must_use]
    pub fn new(max_health: f32) -> Self {
        Self {
            actors: BTreeMap::new(),
            max_health,
        }
    }

    /// Health on spawn.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Adds an actor at a free spawn point, replacing any actor with the same id.
    ///
    /// A blank `name` is replaced by a generated one that no current actor uses.
    pub fn add<R: Rng + ?Sized>(
        &mut self,
        id: ActorId,
        name: Option<&str>,
        kind: ActorKind,
        world: &CollisionIndex,
        rng: &mut R,
    ) -> &Actor {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_owned(),
            None => names::unique_name(rng, |candidate| self.actors.values().any(|a| a.name == candidate)),
        };
        let (color, archetype) = match kind {
            ActorKind::Player => (self.free_player_color(rng), None),
            ActorKind::Bot { archetype, color } => (color, Some(archetype)),
        };
        let actor = Actor {
            id: id.clone(),
            name,
            color,
            position: world.find_spawn_point(rng),
            rotation: Rotation::default(),
            health: self.max_health,
            score: 0,
            archetype,
            death_time: None,
            last_killer_name: None,
            last_shot_ms: None,
            last_input_sequence: 0,
        };
        info!(id = %id, name = %actor.name, bot = actor.is_bot(), "actor joined");
        self.actors.insert(id.clone(), actor);
        &self.actors[&id]
    }

    fn free_player_color<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        PLAYER_COLORS
            .iter()
            .copied()
            .find(|color| !self.actors.values().any(|a| !a.is_bot() && a.color == *color))
            .or_else(|| PLAYER_COLORS.choose(rng).copied())
            .unwrap_or(PLAYER_COLORS[0])
    }

    /// Removes an actor. Its bullets stay in flight.
    pub fn remove(&mut self, id: &str) -> Option<Actor> {
        let removed = self.actors.remove(id);
        if let Some(actor) = &removed {
            info!(id, name = %actor.name, "actor left");
        }
        removed
    }

    /// Looks up an actor.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// Looks up an actor for mutation.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    /// All actors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Live actors in id order.
    pub fn alive(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values().filter(|a| a.is_alive())
    }

    /// Number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// `true` if nobody is here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Moves a live actor towards `desired`, sliding along walls.
    ///
    /// Returns `false` (and changes nothing) for unknown or dead actors.
    pub fn update_position(
        &mut self,
        id: &str,
        desired: Vec3,
        rotation: Rotation,
        input_sequence: Option<u64>,
        world: &CollisionIndex,
    ) -> bool {
        let Some(actor) = self.actors.get_mut(id).filter(|a| a.is_alive()) else {
            return false;
        };
        let desired = if desired.is_finite() { desired } else { actor.position };
        actor.position = world.resolve_movement(actor.position, desired);
        if rotation.is_finite() {
            actor.rotation = rotation;
        }
        if let Some(sequence) = input_sequence {
            actor.last_input_sequence = sequence;
        }
        true
    }

    /// Walks a live actor `speed` units along the XZ direction `(dx, dz)`.
    pub fn walk(&mut self, id: &str, dx: f32, dz: f32, speed: f32, world: &CollisionIndex) {
        let Some(actor) = self.actors.get_mut(id).filter(|a| a.is_alive()) else {
            return;
        };
        let length = (dx * dx + dz * dz).sqrt();
        let length = if length > 0.0 { length } else { 1.0 };
        let desired = Vec3::new(
            actor.position.x + dx / length * speed,
            actor.position.y,
            actor.position.z + dz / length * speed,
        );
        actor.position = world.resolve_movement(actor.position, desired);
    }

    /// Places a live actor at `position` without collision checks.
    pub fn teleport(&mut self, id: &str, position: Vec3) {
        if let Some(actor) = self.actors.get_mut(id).filter(|a| a.is_alive()) {
            actor.position = position;
        }
    }

    /// Subtracts damage from a live actor; health never drops below zero.
    ///
    /// Returns the remaining health, or `None` if the actor is unknown or dead.
    pub fn damage(&mut self, id: &str, amount: f32) -> Option<f32> {
        let actor = self.actors.get_mut(id).filter(|a| a.is_alive())?;
        actor.health = (actor.health - amount.max(0.0)).max(0.0);
        Some(actor.health)
    }

    /// Kills a live actor and records it.
    ///
    /// Without a name override, a killer still in the store is credited by
    /// name and gets [`KILL_SCORE`]. Unknown killers are reported as
    /// `"Game"`. Returns `None` if the victim is unknown or already dead.
    pub fn kill(
        &mut self,
        victim_id: &str,
        killer_id: Option<&str>,
        killer_name_override: Option<&str>,
        book: &mut KillBook,
        now_ms: u64,
    ) -> Option<KillRecord> {
        let victim = self.actors.get(victim_id).filter(|a| a.is_alive())?;
        let victim_name = victim.name.clone();

        let mut killer_name = killer_name_override.map(str::to_owned);
        if killer_name.is_none() {
            if let Some(killer) = killer_id.and_then(|id| self.actors.get_mut(id)) {
                killer.score += KILL_SCORE;
                killer_name = Some(killer.name.clone());
            }
        }
        let killer_name = killer_name.unwrap_or_else(|| GAME_KILLER_NAME.to_owned());

        let victim = self.actors.get_mut(victim_id)?;
        victim.health = 0.0;
        victim.death_time = Some(now_ms);
        victim.last_killer_name = Some(killer_name.clone());

        Some(book.record(
            &killer_name,
            killer_id.unwrap_or(GAME_KILLER_ID),
            &victim_name,
            victim_id,
            now_ms,
        ))
    }

    /// Brings a dead actor back at a fresh spawn point with full health.
    ///
    /// Returns `false` for unknown or live actors.
    pub fn respawn<R: Rng + ?Sized>(&mut self, id: &str, world: &CollisionIndex, rng: &mut R) -> bool {
        let max_health = self.max_health;
        let Some(actor) = self.actors.get_mut(id).filter(|a| !a.is_alive()) else {
            return false;
        };
        actor.position = world.find_spawn_point(rng);
        actor.health = max_health;
        actor.death_time = None;
        actor.last_killer_name = None;
        info!(
            id,
            name = %actor.name,
            x = actor.position.x,
            z = actor.position.z,
            "actor respawned"
        );
        true
    }

    /// Respawns every actor dead for at least `delay_ms`.
    pub fn respawn_due<R: Rng + ?Sized>(
        &mut self,
        delay_ms: u64,
        world: &CollisionIndex,
        rng: &mut R,
        now_ms: u64,
    ) -> Vec<ActorId> {
        let due: Vec<ActorId> = self
            .actors
            .values()
            .filter(|a| a.death_time.is_some_and(|t| now_ms.saturating_sub(t) >= delay_ms))
            .map(|a| a.id.clone())
            .collect();
        for id in &due {
            self.respawn(id.as_str(), world, rng);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_world::{WorldConfig, WorldGenerator, WorldSeed, SIMULATION_STREAM};

    fn world() -> CollisionIndex {
        let layout = WorldGenerator::new(WorldSeed::new(11), 60.0, 1.0, WorldConfig::default())
            .generate_at(0)
            .unwrap();
        CollisionIndex::build(&layout, 1.0, 1.0, 1.8)
    }

    fn store_with(ids: &[&str], world: &CollisionIndex) -> ActorStore {
        let mut rng = WorldSeed::new(1).rng(SIMULATION_STREAM);
        let mut store = ActorStore::new(100.0);
        for id in ids {
            store.add(ActorId::from(*id), Some(id), ActorKind::Player, world, &mut rng);
        }
        store
    }

    #[test]
    fn test_add_assigns_spawn_color_and_name() {
        let world = world();
        let mut rng = WorldSeed::new(1).rng(SIMULATION_STREAM);
        let mut store = ActorStore::new(100.0);
        let a = store.add("a".into(), None, ActorKind::Player, &world, &mut rng).clone();
        let b = store.add("b".into(), Some("  Bob "), ActorKind::Player, &world, &mut rng).clone();
        assert!(!a.name.is_empty());
        assert_eq!(b.name, "Bob");
        assert_ne!(a.color, b.color);
        assert_eq!(a.color, PLAYER_COLORS[0]);
        assert!(world.is_free_for_actor(a.position));
        assert_eq!(a.health, 100.0);
    }

    #[test]
    fn test_bot_keeps_its_color() {
        let world = world();
        let mut rng = WorldSeed::new(1).rng(SIMULATION_STREAM);
        let mut store = ActorStore::new(100.0);
        let kind = ActorKind::Bot {
            archetype: BotArchetype::Danger,
            color: 0x123456,
        };
        let bot = store.add("bot-danger-1".into(), Some("danger1"), kind, &world, &mut rng);
        assert_eq!(bot.color, 0x123456);
        assert!(bot.is_bot());
    }

    #[test]
    fn test_kill_is_idempotent() {
        let world = world();
        let mut store = store_with(&["a", "b"], &world);
        let mut book = KillBook::new(None, 60_000);

        let record = store.kill("b", Some("a"), None, &mut book, 1000).unwrap();
        assert_eq!(record.killer, "a");
        assert_eq!(record.victim_id, "b");
        assert!(store.kill("b", Some("a"), None, &mut book, 1001).is_none());

        assert_eq!(book.len(), 1);
        assert_eq!(store.get("a").unwrap().score, KILL_SCORE);
        let victim = store.get("b").unwrap();
        assert_eq!(victim.health, 0.0);
        assert_eq!(victim.last_killer_name.as_deref(), Some("a"));
    }

    #[test]
    fn test_kill_attribution_fallbacks() {
        let world = world();
        let mut store = store_with(&["a", "b", "c"], &world);
        let mut book = KillBook::new(None, 60_000);

        let by_game = store.kill("a", None, None, &mut book, 10).unwrap();
        assert_eq!(by_game.killer, "Game");
        assert_eq!(by_game.killer_id, "game");

        let by_admin = store.kill("b", Some("debug-admin"), Some("Admin"), &mut book, 10).unwrap();
        assert_eq!(by_admin.killer, "Admin");
        assert_eq!(by_admin.killer_id, "debug-admin");

        let overridden = store.kill("c", Some("a"), Some("Lava"), &mut book, 10).unwrap();
        assert_eq!(overridden.killer, "Lava");
        assert_eq!(store.get("a").unwrap().score, 0);
    }

    #[test]
    fn test_dead_actor_ignores_movement_and_damage() {
        let world = world();
        let mut store = store_with(&["a"], &world);
        let mut book = KillBook::new(None, 60_000);
        let before = store.get("a").unwrap().position;
        store.kill("a", None, None, &mut book, 5);

        let moved = store.update_position("a", before + Vec3::X, Rotation::default(), Some(3), &world);
        assert!(!moved);
        assert_eq!(store.get("a").unwrap().position, before);
        assert_eq!(store.get("a").unwrap().last_input_sequence, 0);
        assert_eq!(store.damage("a", 10.0), None);
        assert!(!store.update_position("ghost", before, Rotation::default(), None, &world));
    }

    #[test]
    fn test_damage_never_goes_negative() {
        let world = world();
        let mut store = store_with(&["a"], &world);
        assert_eq!(store.damage("a", 60.0), Some(40.0));
        assert_eq!(store.damage("a", 60.0), Some(0.0));
    }

    #[test]
    fn test_respawn_only_when_dead() {
        let world = world();
        let mut rng = WorldSeed::new(2).rng(SIMULATION_STREAM);
        let mut store = store_with(&["a"], &world);
        let mut book = KillBook::new(None, 60_000);
        assert!(!store.respawn("a", &world, &mut rng));

        store.kill("a", None, None, &mut book, 1000);
        assert!(store.respawn_due(3000, &world, &mut rng, 2000).is_empty());
        let due = store.respawn_due(3000, &world, &mut rng, 4000);
        assert_eq!(due, vec![ActorId::from("a")]);

        let actor = store.get("a").unwrap();
        assert!(actor.is_alive());
        assert_eq!(actor.health, 100.0);
        assert!(actor.last_killer_name.is_none());
        assert!(world.is_free_for_actor(actor.position));
    }

    #[test]
    fn test_update_position_records_sequence() {
        let world = world();
        let mut store = store_with(&["a"], &world);
        let start = store.get("a").unwrap().position;
        let rotation = Rotation::new(0.1, 0.2);
        assert!(store.update_position("a", start, rotation, Some(42), &world));
        let actor = store.get("a").unwrap();
        assert_eq!(actor.last_input_sequence, 42);
        assert_eq!(actor.rotation, rotation);
        assert!(world.is_free_for_actor(actor.position));
    }
}
