//! # Collision Index
//!
//! Flattened, query-ready view of a [`WorldLayout`]. Built once per server
//! run and shared read-only by movement, projectiles and bot perception.
//!
//! ## Box sets
//!
//! | set | blocks actors | blocks bullets |
//! |-----|---------------|----------------|
//! | solid (walls, segments, upper walls) | yes | yes |
//! | sills (below windows) | yes | no |
//! | floor slabs | no | yes |
//!
//! Floors and ramps are not obstacles: they only raise the terrain height.

mod aabb;
mod grid;

pub use aabb::{Aabb, FlatRect};
pub use grid::BoxGrid;

use crate::layout::{OpeningKind, Ramp, Side, WorldLayout};
use crate::seed::uniform;
use rand::Rng;
use skirmish_shared::{clamp, Vec3};
use tracing::warn;

/// Broadphase cell edge.
const GRID_CELL: f32 = 16.0;

/// Spacing between line-of-sight samples.
const SIGHT_STEP: f32 = 1.2;

/// Height above the ground beyond which an actor may stand on an upper floor.
const UPPER_FLOOR_THRESHOLD: f32 = 0.75;

/// Spawn sampling attempts before falling back to the origin.
const SPAWN_ATTEMPTS: usize = 200;

/// Spatial queries over one generated arena.
#[derive(Clone, Debug)]
pub struct CollisionIndex {
    half_size: f32,
    ground_y: f32,
    actor_radius: f32,
    actor_height: f32,
    /// Solid boxes followed by sill blockers.
    actor_boxes: Vec<Aabb>,
    actor_grid: BoxGrid,
    projectile_boxes: Vec<Aabb>,
    projectile_grid: BoxGrid,
    floors: Vec<FlatRect>,
    ramps: Vec<Ramp>,
}

impl CollisionIndex {
    /// Flattens `layout` into box sets for actors of the given size.
    #[must_use]
    pub fn build(layout: &WorldLayout, ground_y: f32, actor_radius: f32, actor_height: f32) -> Self {
        let mut solid = Vec::new();
        let mut sills = Vec::new();
        let mut slabs = Vec::new();

        solid.extend(layout.walls.iter().map(|w| Aabb::from_volume(&w.volume)));
        solid.extend(layout.upper_walls.iter().map(Aabb::from_volume));

        for building in &layout.buildings {
            solid.extend(building.wall_segments.iter().map(Aabb::from_volume));

            let depth = (building.wall_thickness * 0.9).max(0.6);
            for opening in building.openings.iter().filter(|o| o.kind == OpeningKind::Window) {
                let height = clamp(opening.bottom + 0.22, 1.25, 2.6);
                let span = opening.span().max(0.9);
                let along = (opening.start + opening.end) / 2.0;
                let (center, width, depth) = match opening.side {
                    Side::North => (Vec3::new(building.x + along, 0.0, building.z - building.depth / 2.0), span, depth),
                    Side::South => (Vec3::new(building.x + along, 0.0, building.z + building.depth / 2.0), span, depth),
                    Side::West => (Vec3::new(building.x - building.width / 2.0, 0.0, building.z + along), depth, span),
                    Side::East => (Vec3::new(building.x + building.width / 2.0, 0.0, building.z + along), depth, span),
                };
                sills.push(Aabb::from_center(center.raised(height / 2.0), width, height, depth));
            }
        }

        let mut floors = Vec::with_capacity(layout.second_floors.len());
        for slab in &layout.second_floors {
            floors.push(FlatRect::new(slab.x, slab.z, slab.width, slab.depth, slab.y));
            slabs.push(Aabb::from_center(
                Vec3::new(slab.x, slab.y - slab.thickness / 2.0, slab.z),
                slab.width,
                slab.thickness,
                slab.depth,
            ));
        }

        let extent = layout.half_size + 4.0;
        let mut projectile_boxes = solid.clone();
        projectile_boxes.extend(slabs);
        let mut actor_boxes = solid;
        actor_boxes.extend(sills);

        Self {
            half_size: layout.half_size,
            ground_y,
            actor_radius,
            actor_height,
            actor_grid: BoxGrid::build(&actor_boxes, extent, GRID_CELL),
            actor_boxes,
            projectile_grid: BoxGrid::build(&projectile_boxes, extent, GRID_CELL),
            projectile_boxes,
            floors,
            ramps: layout.ramps.clone(),
        }
    }

    /// Effective arena half-size.
    #[inline]
    #[must_use]
    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    /// Ground level actors stand on.
    #[inline]
    #[must_use]
    pub fn ground_y(&self) -> f32 {
        self.ground_y
    }

    /// Number of boxes that stop actors.
    #[must_use]
    pub fn actor_box_count(&self) -> usize {
        self.actor_boxes.len()
    }

    /// Number of boxes that stop bullets.
    #[must_use]
    pub fn projectile_box_count(&self) -> usize {
        self.projectile_boxes.len()
    }

    /// `true` if an upright cylinder with its feet at `feet` overlaps any
    /// solid or sill box.
    #[must_use]
    pub fn is_blocked_for_actor(&self, feet: Vec3, radius: f32, height: f32) -> bool {
        let top = feet.y + height;
        self.actor_grid.any_near(feet.x, feet.z, radius, |i| {
            let aabb = &self.actor_boxes[i as usize];
            aabb.overlaps_band(feet.y, top) && aabb.intersects_circle_xz(feet.x, feet.z, radius)
        })
    }

    /// `true` if a point is inside a solid box or floor slab. Sills let bullets through.
    #[must_use]
    pub fn is_blocked_for_projectile(&self, point: Vec3) -> bool {
        self.projectile_grid
            .at(point.x, point.z)
            .iter()
            .any(|&i| self.projectile_boxes[i as usize].contains(point))
    }

    /// Height an actor at `(x, z)` stands at, given its current height.
    ///
    /// Ramps always apply. An upper floor only applies when the actor is
    /// already above the ground or standing on a ramp, so walking under a
    /// floor never lifts anyone onto it.
    #[must_use]
    pub fn terrain_height_at(&self, x: f32, z: f32, current_y: f32) -> f32 {
        let mut ramp_height: Option<f32> = None;
        for ramp in &self.ramps {
            let (lx, lz) = ramp.direction.to_local(x - ramp.x, z - ramp.z);
            if lx.abs() <= ramp.length / 2.0 && lz.abs() <= ramp.width / 2.0 {
                let t = clamp((lx + ramp.length / 2.0) / ramp.length, 0.0, 1.0);
                let y = ramp.start_y + (ramp.end_y - ramp.start_y) * t;
                ramp_height = Some(ramp_height.map_or(y, |h| h.max(y)));
            }
        }

        let mut target = ramp_height.map_or(self.ground_y, |h| h.max(self.ground_y));
        let may_use_floor = current_y > self.ground_y + UPPER_FLOOR_THRESHOLD || ramp_height.is_some();
        if may_use_floor {
            for floor in self.floors.iter().filter(|f| f.contains_xz(x, z)) {
                target = target.max(floor.y);
            }
        }
        target
    }

    /// Samples the segment every ~1.2 units; any bullet-blocking sample fails.
    #[must_use]
    pub fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        let distance = from.distance(to);
        let steps = ((distance / SIGHT_STEP).ceil() as usize).max(2);
        let delta = to - from;
        (1..=steps).all(|step| {
            let t = step as f32 / steps as f32;
            !self.is_blocked_for_projectile(from + delta * t)
        })
    }

    /// Moves an actor from `current` towards `desired`, sliding along walls.
    ///
    /// X is tried first, then Z from the possibly updated X, then the height
    /// is recomputed. If the result is still blocked the actor stays put.
    #[must_use]
    pub fn resolve_movement(&self, current: Vec3, desired: Vec3) -> Vec3 {
        let limit = self.half_size - 1.0;
        let want_x = clamp(desired.x, -limit, limit);
        let want_z = clamp(desired.z, -limit, limit);
        let (radius, height) = (self.actor_radius, self.actor_height);

        let mut x = current.x;
        let mut z = current.z;

        let step_y = self.terrain_height_at(want_x, z, current.y);
        if !self.is_blocked_for_actor(Vec3::new(want_x, step_y, z), radius, height) {
            x = want_x;
        }

        let step_y = self.terrain_height_at(x, want_z, current.y);
        if !self.is_blocked_for_actor(Vec3::new(x, step_y, want_z), radius, height) {
            z = want_z;
        }

        let y = self.terrain_height_at(x, z, current.y);
        let resolved = Vec3::new(x, y, z);
        if self.is_blocked_for_actor(resolved, radius, height) {
            return Vec3::new(current.x, self.terrain_height_at(current.x, current.z, current.y), current.z);
        }
        resolved
    }

    /// Rejection-samples a free spawn point; falls back to the origin.
    pub fn find_spawn_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let limit = self.half_size - 3.0;
        for _ in 0..SPAWN_ATTEMPTS {
            let x = uniform(rng, -limit, limit);
            let z = uniform(rng, -limit, limit);
            let y = self.terrain_height_at(x, z, self.ground_y);
            let candidate = Vec3::new(x, y, z);
            if !self.is_blocked_for_actor(candidate, self.actor_radius, self.actor_height) {
                return candidate;
            }
        }
        warn!(attempts = SPAWN_ATTEMPTS, "no free spawn point found, using origin");
        Vec3::new(0.0, self.ground_y, 0.0)
    }

    /// `true` if an actor-sized body fits at `feet`.
    #[must_use]
    pub fn is_free_for_actor(&self, feet: Vec3) -> bool {
        !self.is_blocked_for_actor(feet, self.actor_radius, self.actor_height)
    }
}
