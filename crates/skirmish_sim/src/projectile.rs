//! # Projectile System
//!
//! Bullets fly in straight lines, one step per tick. Each tick:
//!
//! 1. Bucket live actors into a uniform XZ grid.
//! 2. Advance every bullet and age it.
//! 3. Drop it if it is inside world geometry.
//! 4. Otherwise test the 3x3 cells around it; the first live non-owner
//!    within the hit radius takes the damage and the bullet is gone.
//! 5. Drop it if it reached its maximum age.
//!
//! Survivors are staged in a new list that replaces the old one.

use crate::actor::{ActorId, ActorStore};
use crate::config::CombatConfig;
use crate::kills::{KillBook, KillRecord};
use serde::Serialize;
use skirmish_shared::{Rotation, Vec3};
use skirmish_world::CollisionIndex;
use std::collections::HashMap;

/// A bullet in flight.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bullet {
    /// `<owner>-<n>`.
    pub id: String,
    /// Shooter.
    #[serde(rename = "playerId")]
    pub owner: ActorId,
    /// Current position.
    pub position: Vec3,
    /// Unit direction.
    pub direction: Vec3,
    /// Distance per tick.
    pub speed: f32,
    /// Damage on hit.
    #[serde(skip)]
    pub damage: f32,
    /// Ticks lived.
    pub age: u32,
    /// Ticks before expiry.
    pub max_age: u32,
}

/// What one projectile tick did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectileReport {
    /// Bullets that hit an actor.
    pub hits: u32,
    /// Bullets stopped by geometry.
    pub blocked: u32,
    /// Bullets that aged out.
    pub expired: u32,
    /// Kills caused by hits.
    pub kills: Vec<KillRecord>,
}

/// All bullets in flight plus the numbers they are created with.
#[derive(Clone, Debug)]
pub struct ProjectileSystem {
    bullets: Vec<Bullet>,
    next_id: u64,
    speed: f32,
    damage: f32,
    max_age: u32,
    hit_distance_sq: f32,
    cell_size: f32,
}

impl ProjectileSystem {
    /// Creates an empty system.
    #[must_use]
    pub fn new(combat: &CombatConfig, cell_size: f32) -> Self {
        Self {
            bullets: Vec::new(),
            next_id: 0,
            speed: combat.bullet_speed,
            damage: combat.bullet_damage,
            max_age: combat.bullet_max_age.max(1),
            hit_distance_sq: combat.bullet_hit_distance * combat.bullet_hit_distance,
            cell_size: cell_size.max(2.0),
        }
    }

    /// Bullets in flight, oldest first.
    #[must_use]
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Number of bullets in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    /// `true` if nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    /// Spawns a bullet. Cooldowns are the caller's business.
    ///
    /// Multipliers are floored at 0.25.
    pub fn fire(
        &mut self,
        owner: &ActorId,
        origin: Vec3,
        direction: Vec3,
        speed_multiplier: f32,
        damage_multiplier: f32,
    ) -> &Bullet {
        let id = format!("{owner}-{}", self.next_id);
        self.next_id += 1;
        self.bullets.push(Bullet {
            id,
            owner: owner.clone(),
            position: origin,
            direction: direction.normalize_or(Rotation::default().forward()),
            speed: self.speed * speed_multiplier.max(0.25),
            damage: self.damage * damage_multiplier.max(0.25),
            age: 0,
            max_age: self.max_age,
        });
        &self.bullets[self.bullets.len() - 1]
    }

    /// Advances every bullet one tick and resolves hits.
    pub fn tick(
        &mut self,
        actors: &mut ActorStore,
        world: &CollisionIndex,
        kills: &mut KillBook,
        now_ms: u64,
    ) -> ProjectileReport {
        let mut report = ProjectileReport::default();
        let grid = ActorGrid::build(actors, self.cell_size);
        let mut survivors = Vec::with_capacity(self.bullets.len());

        for mut bullet in std::mem::take(&mut self.bullets) {
            bullet.position += bullet.direction * bullet.speed;
            bullet.age += 1;

            if world.is_blocked_for_projectile(bullet.position) {
                report.blocked += 1;
                continue;
            }

            if let Some(victim) = grid.first_hit(&bullet, actors, self.hit_distance_sq) {
                report.hits += 1;
                if actors.damage(victim.as_str(), bullet.damage).is_some_and(|health| health <= 0.0) {
                    report.kills.extend(actors.kill(
                        victim.as_str(),
                        Some(bullet.owner.as_str()),
                        None,
                        kills,
                        now_ms,
                    ));
                }
                continue;
            }

            if bullet.age >= bullet.max_age {
                report.expired += 1;
                continue;
            }
            survivors.push(bullet);
        }

        self.bullets = survivors;
        report
    }
}

type Cell = (i32, i32);

/// Live actor positions bucketed by XZ cell.
struct ActorGrid {
    cell_size: f32,
    cells: HashMap<Cell, Vec<(ActorId, Vec3)>>,
}

impl ActorGrid {
    fn build(actors: &ActorStore, cell_size: f32) -> Self {
        let mut cells: HashMap<Cell, Vec<(ActorId, Vec3)>> = HashMap::new();
        for actor in actors.alive() {
            let cell = Self::cell_of(actor.position, cell_size);
            cells.entry(cell).or_default().push((actor.id.clone(), actor.position));
        }
        Self { cell_size, cells }
    }

    fn cell_of(position: Vec3, cell_size: f32) -> Cell {
        (
            (position.x / cell_size).floor() as i32,
            (position.z / cell_size).floor() as i32,
        )
    }

    /// First live non-owner within the hit radius, scanning the 3x3 block.
    fn first_hit(&self, bullet: &Bullet, actors: &ActorStore, hit_distance_sq: f32) -> Option<ActorId> {
        let (cx, cz) = Self::cell_of(bullet.position, self.cell_size);
        for dx in -1..=1 {
            for dz in -1..=1 {
                let Some(bucket) = self.cells.get(&(cx + dx, cz + dz)) else {
                    continue;
                };
                for (id, position) in bucket {
                    if *id == bullet.owner || position.distance_squared(bullet.position) >= hit_distance_sq {
                        continue;
                    }
                    // A victim killed earlier this tick is still bucketed.
                    if actors.get(id.as_str()).is_some_and(|a| a.is_alive()) {
                        return Some(id.clone());
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorKind;
    use skirmish_world::{StreetGrid, Volume, Wall, WallKind, WorldLayout, WorldSeed, SIMULATION_STREAM};

    fn layout_with(walls: Vec<Wall>) -> WorldLayout {
        WorldLayout {
            generated_at: 0,
            seed: 0,
            half_size: 100.0,
            streets: StreetGrid::default(),
            walls,
            buildings: Vec::new(),
            second_floors: Vec::new(),
            upper_walls: Vec::new(),
            ramps: Vec::new(),
        }
    }

    fn open_world() -> CollisionIndex {
        CollisionIndex::build(&layout_with(Vec::new()), 1.0, 1.0, 1.8)
    }

    fn place(store: &mut ActorStore, id: &str, position: Vec3, world: &CollisionIndex) {
        let mut rng = WorldSeed::new(1).rng(SIMULATION_STREAM);
        store.add(id.into(), Some(id), ActorKind::Player, world, &mut rng);
        store.teleport(id, position);
    }

    #[test]
    fn test_bullet_moves_and_expires() {
        let world = open_world();
        let mut store = ActorStore::new(100.0);
        let mut book = KillBook::new(None, 60_000);
        let combat = CombatConfig {
            bullet_max_age: 3,
            ..CombatConfig::default()
        };
        let mut system = ProjectileSystem::new(&combat, 8.0);
        system.fire(&"a".into(), Vec3::new(0.0, 1.6, 0.0), Vec3::new(2.0, 0.0, 0.0), 1.0, 1.0);

        system.tick(&mut store, &world, &mut book, 0);
        assert_eq!(system.bullets()[0].position.x, 1.0);
        assert_eq!(system.bullets()[0].age, 1);
        system.tick(&mut store, &world, &mut book, 0);
        let report = system.tick(&mut store, &world, &mut book, 0);
        assert_eq!(report.expired, 1);
        assert!(system.is_empty());
    }

    #[test]
    fn test_ids_are_scoped_to_owner() {
        let mut system = ProjectileSystem::new(&CombatConfig::default(), 8.0);
        let first = system.fire(&"a".into(), Vec3::ZERO, Vec3::X, 1.0, 1.0).id.clone();
        let second = system.fire(&"b".into(), Vec3::ZERO, Vec3::X, 1.0, 1.0).id.clone();
        assert!(first.starts_with("a-"));
        assert!(second.starts_with("b-"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_multipliers_are_floored() {
        let mut system = ProjectileSystem::new(&CombatConfig::default(), 8.0);
        let bullet = system.fire(&"a".into(), Vec3::ZERO, Vec3::X, 0.0, 2.0);
        assert_eq!(bullet.speed, 0.25);
        assert_eq!(bullet.damage, 50.0);
    }

    #[test]
    fn test_hit_removes_bullet_and_spares_owner() {
        let world = open_world();
        let mut store = ActorStore::new(100.0);
        let mut book = KillBook::new(None, 60_000);
        place(&mut store, "shooter", Vec3::new(0.0, 1.0, 0.0), &world);
        place(&mut store, "target", Vec3::new(3.0, 1.0, 0.0), &world);

        let mut system = ProjectileSystem::new(&CombatConfig::default(), 8.0);
        system.fire(&"shooter".into(), Vec3::new(0.0, 1.6, 0.0), Vec3::X, 1.0, 1.0);
        let first = system.tick(&mut store, &world, &mut book, 0);
        assert_eq!(first.hits, 0);
        let second = system.tick(&mut store, &world, &mut book, 0);
        assert_eq!(second.hits, 1);
        assert!(system.is_empty());
        assert_eq!(store.get("target").unwrap().health, 75.0);
        assert_eq!(store.get("shooter").unwrap().health, 100.0);
    }

    #[test]
    fn test_one_hit_per_bullet() {
        let world = open_world();
        let mut store = ActorStore::new(100.0);
        let mut book = KillBook::new(None, 60_000);
        place(&mut store, "a", Vec3::new(1.0, 1.0, 0.5), &world);
        place(&mut store, "b", Vec3::new(1.0, 1.0, -0.5), &world);

        let mut system = ProjectileSystem::new(&CombatConfig::default(), 8.0);
        system.fire(&"x".into(), Vec3::new(0.0, 1.0, 0.0), Vec3::X, 1.0, 1.0);
        let report = system.tick(&mut store, &world, &mut book, 0);
        assert_eq!(report.hits, 1);
        let total: f32 = store.iter().map(|a| a.health).sum();
        assert_eq!(total, 175.0);
    }

    #[test]
    fn test_walls_stop_bullets() {
        let wall = Wall {
            kind: WallKind::StreetWall,
            volume: Volume::grounded(2.0, 0.0, 1.0, 10.0, 4.0),
        };
        let world = CollisionIndex::build(&layout_with(vec![wall]), 1.0, 1.0, 1.8);
        let mut store = ActorStore::new(100.0);
        let mut book = KillBook::new(None, 60_000);
        let mut system = ProjectileSystem::new(&CombatConfig::default(), 8.0);
        system.fire(&"x".into(), Vec3::new(0.0, 1.6, 0.0), Vec3::X, 1.0, 1.0);
        system.tick(&mut store, &world, &mut book, 0);
        let report = system.tick(&mut store, &world, &mut book, 0);
        assert_eq!(report.blocked, 1);
        assert!(system.is_empty());
    }

    #[test]
    fn test_bullet_wire_names() {
        let mut system = ProjectileSystem::new(&CombatConfig::default(), 8.0);
        let bullet = system.fire(&"a".into(), Vec3::ZERO, Vec3::X, 1.0, 1.0);
        let json = serde_json::to_string(bullet).unwrap();
        assert!(json.contains("\"playerId\":\"a\""));
        assert!(json.contains("\"maxAge\":300"));
        assert!(!json.contains("damage"));
    }
}
