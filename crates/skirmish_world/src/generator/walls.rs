//! Free-standing walls: the arena boundary, the gated outer ring, street
//! obstacles and intersection crosses.

use crate::config::WorldConfig;
use crate::layout::{Volume, Wall, WallKind};
use crate::seed::{chance, uniform};
use rand::Rng;
use skirmish_shared::clamp;

const BOUNDARY_THICKNESS: f32 = 2.2;
const BOUNDARY_HEIGHT: f32 = 8.0;
const STREET_WALL_HEIGHT: f32 = 3.4;
const STREET_WALLS_PER_STREET: usize = 2;

/// XZ rectangle used to keep walls away from gates and the open centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Zone {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Zone {
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self { min_x, max_x, min_z, max_z }
    }

    /// Square of half-size `half` around `(x, z)`.
    pub fn around(x: f32, z: f32, half: f32) -> Self {
        Self::new(x - half, x + half, z - half, z + half)
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    pub fn touches(&self, volume: &Volume) -> bool {
        let (hw, hd) = (volume.width / 2.0, volume.depth / 2.0);
        !(volume.x + hw < self.min_x
            || volume.x - hw > self.max_x
            || volume.z + hd < self.min_z
            || volume.z - hd > self.max_z)
    }
}

/// The four walls enclosing the playable square.
pub(crate) fn boundary_walls(half_size: f32) -> Vec<Wall> {
    let span = half_size * 2.0;
    let wall = |x, z, width, depth| Wall {
        kind: WallKind::Boundary,
        volume: Volume::grounded(x, z, width, depth, BOUNDARY_HEIGHT),
    };
    vec![
        wall(0.0, -half_size, span, BOUNDARY_THICKNESS),
        wall(0.0, half_size, span, BOUNDARY_THICKNESS),
        wall(-half_size, 0.0, BOUNDARY_THICKNESS, span),
        wall(half_size, 0.0, BOUNDARY_THICKNESS, span),
    ]
}

/// Geometry of the inner wall ring. The ring is square, `wall_abs` from the
/// centre on every side, gated at the corners and at every side midpoint.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OuterRing {
    pub thickness: f32,
    pub height: f32,
    pub corner_open: f32,
    pub middle_open: f32,
    pub span_min: f32,
    pub span_max: f32,
    pub wall_abs: f32,
}

impl OuterRing {
    pub fn new(half_size: f32, config: &WorldConfig, block_width: f32, block_depth: f32, street_width: f32) -> Self {
        let derived_inset = (block_width.max(block_depth) + street_width * 0.5) * config.perimeter_free_band_cells;
        let base_inset = (half_size * 0.12).max(10.0);
        let inset = clamp(base_inset.max(derived_inset), 6.0, half_size * 0.42);
        let corner_open = clamp(
            config.outer_corner_opening_min.max(half_size * config.outer_corner_opening_ratio),
            8.0,
            half_size * 0.42,
        );
        let middle_open = clamp(
            config.outer_middle_opening_min.max(half_size * config.outer_middle_opening_ratio),
            10.0,
            half_size * 0.62,
        );
        Self {
            thickness: config.outer_wall_thickness,
            height: config.outer_wall_height,
            corner_open,
            middle_open,
            span_min: -half_size + corner_open,
            span_max: half_size - corner_open,
            wall_abs: half_size - inset,
        }
    }

    /// Gate left where two ring sides would meet.
    fn junction_open(&self, half_size: f32) -> f32 {
        clamp(self.middle_open, 4.0, half_size * 0.62)
    }

    /// Wall pieces of all four sides.
    pub fn walls(&self, half_size: f32) -> Vec<Wall> {
        let half_middle = self.middle_open / 2.0;
        let half_junction = self.junction_open(half_size) / 2.0;
        let cuts = [
            (-half_middle, half_middle),
            (-self.wall_abs - half_junction, -self.wall_abs + half_junction),
            (self.wall_abs - half_junction, self.wall_abs + half_junction),
        ];
        let pieces = subtract_intervals(self.span_min, self.span_max, &cuts);

        let mut walls = Vec::with_capacity(pieces.len() * 4);
        for fixed in [-self.wall_abs, self.wall_abs] {
            for &(start, end) in &pieces {
                walls.push(Wall {
                    kind: WallKind::OuterStraight,
                    volume: Volume::grounded((start + end) / 2.0, fixed, end - start, self.thickness, self.height),
                });
            }
        }
        for fixed in [-self.wall_abs, self.wall_abs] {
            for &(start, end) in &pieces {
                walls.push(Wall {
                    kind: WallKind::OuterStraight,
                    volume: Volume::grounded(fixed, (start + end) / 2.0, self.thickness, end - start, self.height),
                });
            }
        }
        walls
    }

    /// Zones no wall may touch (the ring lines and every gate), plus zones
    /// only crosses must avoid (a band of grid spaces inside the ring).
    pub fn exclusion_zones(
        &self,
        half_size: f32,
        config: &WorldConfig,
        street_width: f32,
        grid_step: (f32, f32),
    ) -> (Vec<Zone>, Vec<Zone>) {
        let padding = clamp((street_width * 0.45).max(2.2), 1.2, 12.0);
        let line_half = self.thickness / 2.0 + padding;
        let abs = self.wall_abs;
        let middle_half = self.middle_open / 2.0;
        let mut shared = Vec::new();

        // Ring lines.
        shared.push(Zone::new(self.span_min, self.span_max, -abs - line_half, -abs + line_half));
        shared.push(Zone::new(self.span_min, self.span_max, abs - line_half, abs + line_half));
        shared.push(Zone::new(-abs - line_half, -abs + line_half, self.span_min, self.span_max));
        shared.push(Zone::new(abs - line_half, abs + line_half, self.span_min, self.span_max));

        // Midpoint gates.
        let gate = middle_half + padding;
        for fixed in [-abs, abs] {
            shared.push(Zone::new(-gate, gate, fixed - line_half, fixed + line_half));
            shared.push(Zone::new(fixed - line_half, fixed + line_half, -gate, gate));
        }

        // Corner gates of the arena.
        let corner = self.corner_open + padding;
        shared.push(Zone::new(-half_size, -half_size + corner, -half_size, -half_size + corner));
        shared.push(Zone::new(half_size - corner, half_size, -half_size, -half_size + corner));
        shared.push(Zone::new(-half_size, -half_size + corner, half_size - corner, half_size));
        shared.push(Zone::new(half_size - corner, half_size, half_size - corner, half_size));

        // Ring corner junctions.
        let clearance = (line_half * 1.2)
            .max(self.junction_open(half_size) * 0.6)
            .max(street_width * 0.9);
        for x in [-abs, abs] {
            for z in [-abs, abs] {
                shared.push(Zone::around(x, z, clearance));
            }
        }

        let mut cross_only = Vec::new();
        if config.outer_cross_no_spawn_spaces > 0.0 {
            let buffer_x = config.outer_cross_no_spawn_spaces * grid_step.0.max(1.0);
            let buffer_z = config.outer_cross_no_spawn_spaces * grid_step.1.max(1.0);
            let lo = self.span_min - line_half;
            let hi = self.span_max + line_half;
            cross_only.push(Zone::new(-abs - line_half, -abs + buffer_x, lo, hi));
            cross_only.push(Zone::new(abs - buffer_x, abs + line_half, lo, hi));
            cross_only.push(Zone::new(lo, hi, -abs - line_half, -abs + buffer_z));
            cross_only.push(Zone::new(lo, hi, abs - buffer_z, abs + line_half));
        }

        (shared, cross_only)
    }
}

/// Removes `cuts` from `[start, end]`, dropping slivers of 0.2 or less.
pub(crate) fn subtract_intervals(start: f32, end: f32, cuts: &[(f32, f32)]) -> Vec<(f32, f32)> {
    if !start.is_finite() || !end.is_finite() || end - start <= 0.2 {
        return Vec::new();
    }
    let mut cuts: Vec<(f32, f32)> = cuts
        .iter()
        .map(|&(a, b)| (clamp(a, start, end), clamp(b, start, end)))
        .filter(|(a, b)| b - a > 0.05)
        .collect();
    cuts.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut pieces = Vec::new();
    let mut cursor = start;
    for (a, b) in cuts {
        if a > cursor {
            pieces.push((cursor, a));
        }
        cursor = cursor.max(b);
    }
    if cursor < end {
        pieces.push((cursor, end));
    }
    pieces.retain(|(a, b)| b - a > 0.2);
    pieces
}

/// Two short obstacles down the middle of every street.
pub(crate) fn street_walls(centers: &[f32], span_min: f32, span_max: f32, lane: f32, along_x: bool) -> Vec<Wall> {
    let length = ((span_max - span_min) * 0.24).max(8.0);
    let depth = lane * 0.18;
    let mut walls = Vec::with_capacity(centers.len() * STREET_WALLS_PER_STREET);
    for &center in centers {
        for index in 0..STREET_WALLS_PER_STREET {
            let t = (index + 1) as f32 / (STREET_WALLS_PER_STREET + 1) as f32;
            let along = span_min + (span_max - span_min) * t;
            let volume = if along_x {
                Volume::grounded(along, center, length, depth, STREET_WALL_HEIGHT)
            } else {
                Volume::grounded(center, along, depth, length, STREET_WALL_HEIGHT)
            };
            walls.push(Wall { kind: WallKind::StreetWall, volume });
        }
    }
    walls
}

/// Crosses at street intersections, away from the open centre and any zone.
#[allow(clippy::too_many_arguments)]
pub(crate) fn cross_walls<R: Rng + ?Sized>(
    vertical: &[f32],
    horizontal: &[f32],
    lane: f32,
    config: &WorldConfig,
    center: (f32, f32),
    clear_radius: f32,
    zones: &[Zone],
    rng: &mut R,
) -> Vec<Wall> {
    if !config.crossed_walls {
        return Vec::new();
    }

    let thickness = clamp(lane * 0.18, 1.2, lane * 0.45);
    let length_min = clamp(lane * 0.55, 2.2, lane * 2.1);
    let length_max = clamp(lane * 0.95, length_min, lane * 2.6);
    let base_arm = clamp(uniform(rng, length_min, length_max), length_min, length_max);
    let long_arm = clamp(base_arm * config.crossed_wall_long_multiplier, 2.4, lane * 3.6);

    let mut walls = Vec::new();
    for &x in vertical {
        for &z in horizontal {
            let near_center = (x - center.0).hypot(z - center.1) <= clear_radius;
            if near_center || zones.iter().any(|zone| zone.contains(x, z)) {
                continue;
            }
            if !chance(rng, config.crossed_wall_chance) {
                continue;
            }
            let arm = if chance(rng, config.crossed_wall_long_chance) { long_arm } else { base_arm };
            let height = config.crossed_wall_height;
            walls.push(Wall {
                kind: WallKind::CrossPattern,
                volume: Volume::grounded(x, z, arm * 2.0, thickness, height),
            });
            walls.push(Wall {
                kind: WallKind::CrossPattern,
                volume: Volume::grounded(x, z, thickness, arm * 2.0, height),
            });
        }
    }
    walls
}
