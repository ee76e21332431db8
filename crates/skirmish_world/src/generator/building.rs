//! Single building generation: doors, windows, solid wall pieces and, for
//! some buildings, a walkable second floor with a ramp up to it.

use crate::config::WorldConfig;
use crate::layout::{Building, FloorSlab, Opening, OpeningKind, Ramp, RampHeading, Side, Volume};
use crate::seed::{chance, uniform};
use rand::seq::SliceRandom;
use rand::Rng;
use skirmish_shared::clamp;

/// Openings keep this far from the side ends.
const SIDE_PADDING: f32 = 0.55;
/// Spans this thin are not worth a wall piece.
const MIN_PIECE: f32 = 0.12;
/// Smallest floor edge that gets a second floor.
const MIN_FLOOR_EDGE: f32 = 9.0;
/// Gap between a ramp's low end and the ring behind it.
const RAMP_CLEARANCE: f32 = 0.2;

/// Where a building goes and how much room it has.
#[derive(Clone, Debug)]
pub(crate) struct Plot {
    pub id: String,
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
    pub lot_width: f32,
    pub lot_depth: f32,
}

/// A building and everything standing on or in it.
#[derive(Clone, Debug)]
pub(crate) struct BuildingParts {
    pub building: Building,
    pub floors: Vec<FloorSlab>,
    pub upper_walls: Vec<Volume>,
    pub ramp: Option<Ramp>,
}

pub(crate) fn build<R: Rng + ?Sized>(plot: Plot, config: &WorldConfig, ground_y: f32, rng: &mut R) -> BuildingParts {
    let wall_thickness = uniform(rng, 1.2, 2.0);
    let wall_height = uniform(rng, 7.4, 9.2);
    let (width, depth) = (plot.width, plot.depth);

    let threshold = config.large_building_door_threshold;
    let large = width.max(depth) >= threshold || width * depth >= threshold * threshold * 0.9;
    let door_sides = pick_door_sides(width, depth, large, config, rng);
    let door_width = clamp(uniform(rng, 4.5, 6.5), 3.2, width.min(depth) - 3.0);

    let mut building = Building {
        id: plot.id,
        x: plot.x,
        z: plot.z,
        width,
        depth,
        lot_width: plot.lot_width,
        lot_depth: plot.lot_depth,
        wall_thickness,
        wall_height,
        door_sides,
        openings: Vec::new(),
        wall_segments: Vec::new(),
        second_floor_y: None,
    };
    cut_walls(&mut building, door_width, config.window_combine_chance, rng);

    let mut parts = BuildingParts {
        building,
        floors: Vec::new(),
        upper_walls: Vec::new(),
        ramp: None,
    };

    let floor_width = (width - wall_thickness * 2.4).max(5.0);
    let floor_depth = (depth - wall_thickness * 2.4).max(5.0);
    if floor_width >= MIN_FLOOR_EDGE && floor_depth >= MIN_FLOOR_EDGE && chance(rng, config.second_floor_chance) {
        add_second_floor(&mut parts, (floor_width, floor_depth), config, ground_y, rng);
    }
    parts
}

fn pick_door_sides<R: Rng + ?Sized>(width: f32, depth: f32, large: bool, config: &WorldConfig, rng: &mut R) -> Vec<Side> {
    let wanted = if large {
        if chance(rng, 0.5) { 2 } else { 3 }
    } else if chance(rng, 0.72) {
        1
    } else {
        2
    };
    let mut sides = Side::ALL;
    sides.shuffle(rng);
    let chosen = wanted.min(config.max_door_sides as usize).max(1);

    let mut doors = Vec::new();
    for &side in &sides[..chosen] {
        let length = if side.runs_along_x() { width } else { depth };
        let multiple = large && length >= config.large_building_door_threshold * 0.88;
        let count = if !multiple {
            1
        } else if chance(rng, 0.65) {
            2
        } else {
            config.large_building_doors_per_side
        };
        doors.extend(std::iter::repeat(side).take(count as usize));
    }
    doors
}

/// Openings on one side, measured along the side from its centre.
struct SideOpenings {
    side: Side,
    min: f32,
    max: f32,
    wall_height: f32,
    items: Vec<Opening>,
}

impl SideOpenings {
    fn new(side: Side, length: f32, wall_height: f32) -> Self {
        Self {
            side,
            min: -length / 2.0,
            max: length / 2.0,
            wall_height,
            items: Vec::new(),
        }
    }

    /// Clamps and adds an opening unless it ends up too small or too close
    /// to one already placed.
    fn try_add(&mut self, kind: OpeningKind, start: f32, end: f32, bottom: f32, top: f32) -> bool {
        let lo = self.min + SIDE_PADDING;
        let hi = self.max - SIDE_PADDING;
        let candidate = Opening {
            side: self.side,
            kind,
            start: clamp(start, lo, hi),
            end: clamp(end, lo, hi),
            bottom: match kind {
                OpeningKind::Door => 0.0,
                OpeningKind::Window => clamp(bottom, 0.05, self.wall_height - 0.8),
            },
            top: clamp(top, 0.3, self.wall_height - 0.25),
        };
        if candidate.span() < 0.9 || candidate.top - candidate.bottom < 0.7 {
            return false;
        }
        let crowded = self.items.iter().any(|o| {
            let along = !(candidate.end + 0.35 <= o.start || candidate.start >= o.end + 0.35);
            let vertical = !(candidate.top + 0.2 <= o.bottom || candidate.bottom >= o.top + 0.2);
            along && vertical
        });
        if crowded {
            return false;
        }
        self.items.push(candidate);
        true
    }
}

fn side_openings<R: Rng + ?Sized>(
    side: Side,
    length: f32,
    doors: usize,
    door_width: f32,
    wall_height: f32,
    combine_chance: f32,
    rng: &mut R,
) -> Vec<Opening> {
    let mut set = SideOpenings::new(side, length, wall_height);

    if doors > 0 {
        let count = doors.clamp(1, 4);
        let lane = length / (count + 1) as f32;
        let width = clamp(door_width.min(lane * 0.82), 2.8, door_width.min(length - 2.2).max(2.8));
        for index in 0..count {
            let base = set.min + lane * (index + 1) as f32;
            let jitter = lane * uniform(rng, -0.09, 0.09);
            let center = clamp(base + jitter, set.min + 1.1, set.max - 1.1);
            let top = clamp(uniform(rng, 2.8, 3.4), 2.6, wall_height - 0.9);
            set.try_add(OpeningKind::Door, center - width / 2.0, center + width / 2.0, 0.0, top);
        }
    }

    let window_width = clamp(length * uniform(rng, 0.2, 0.28), 2.6, 4.4);
    let gap = clamp(window_width * uniform(rng, 0.34, 0.5), 1.0, 2.2);
    let padded_min = set.min + 0.8;
    let padded_max = set.max - 0.8;
    let usable = (padded_max - padded_min).max(0.0);
    let stride = window_width + gap;
    let slots = (((usable + gap) / stride.max(0.01)).floor() as usize).max(1);

    let occupied = slots as f32 * window_width + (slots - 1) as f32 * gap;
    let first_center = (padded_min + padded_max) / 2.0 - occupied / 2.0 + window_width / 2.0;
    let slot_center = |index: usize| first_center + index as f32 * stride;

    let bottom = clamp(uniform(rng, 0.9, 1.25), 0.75, (wall_height - 2.8).max(0.75));
    let height = clamp(uniform(rng, 1.9, 2.8), 1.7, (wall_height - bottom - 0.45).max(1.7));
    let occupancy = if doors > 0 { uniform(rng, 0.55, 0.78) } else { uniform(rng, 0.68, 0.9) };

    let mut used: Vec<bool> = (0..slots).map(|_| rng.gen::<f32>() <= occupancy).collect();
    if !used.iter().any(|&u| u) {
        used[slots / 2] = true;
    }

    let mut created = 0;
    let mut index = 0;
    while index < slots {
        if !used[index] {
            index += 1;
            continue;
        }
        let mut span = 1;
        if index + 1 < slots && used[index + 1] && chance(rng, combine_chance) {
            span = 2;
            used[index + 1] = false;
        }
        let start = slot_center(index) - window_width / 2.0;
        let end = slot_center(index + span - 1) + window_width / 2.0;
        if set.try_add(OpeningKind::Window, start, end, bottom, bottom + height) {
            created += 1;
        }
        index += span;
    }

    if created == 0 {
        let center = slot_center(slots / 2);
        set.try_add(
            OpeningKind::Window,
            center - window_width / 2.0,
            center + window_width / 2.0,
            bottom,
            bottom + height,
        );
    }

    set.items.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.bottom.total_cmp(&b.bottom)));
    set.items
}

/// Fills each side with solid pieces around its openings.
fn cut_walls<R: Rng + ?Sized>(building: &mut Building, door_width: f32, combine_chance: f32, rng: &mut R) {
    let door_width = clamp(door_width, 2.8, (building.width.min(building.depth) - 2.0).max(2.8));
    let height = building.wall_height;
    let thickness = building.wall_thickness;

    let mut by_side: Vec<(Side, Vec<Opening>)> = Vec::with_capacity(4);
    for side in Side::ALL {
        let doors = building.door_sides.iter().filter(|&&s| s == side).count();
        let length = building.side_length(side);
        by_side.push((side, side_openings(side, length, doors, door_width, height, combine_chance, rng)));
    }

    let mut segments = Vec::new();
    for (side, openings) in &by_side {
        let length = building.side_length(*side);
        let mut along_cuts = vec![-length / 2.0, length / 2.0];
        let mut height_cuts = vec![0.0, height];
        for o in openings {
            along_cuts.extend([o.start, o.end]);
            height_cuts.extend([o.bottom, o.top]);
        }
        let along_cuts = unique_sorted(along_cuts);
        let height_cuts = unique_sorted(height_cuts);

        for u in along_cuts.windows(2) {
            let u_span = u[1] - u[0];
            if u_span <= MIN_PIECE {
                continue;
            }
            for y in height_cuts.windows(2) {
                let y_span = y[1] - y[0];
                if y_span <= MIN_PIECE {
                    continue;
                }
                let u_mid = (u[0] + u[1]) / 2.0;
                let y_mid = (y[0] + y[1]) / 2.0;
                let in_opening = openings
                    .iter()
                    .any(|o| u_mid > o.start && u_mid < o.end && y_mid > o.bottom && y_mid < o.top);
                if in_opening {
                    continue;
                }
                segments.push(side_piece(building, *side, u_mid, u_span, y_mid, y_span, thickness));
            }
        }
    }

    if segments.is_empty() {
        for side in Side::ALL {
            let length = building.side_length(side);
            segments.push(side_piece(building, side, 0.0, length, height / 2.0, height, thickness));
        }
    }

    building.wall_segments = segments;
    // Published order: north, south, east, west.
    by_side.sort_by_key(|(side, _)| match side {
        Side::North => 0,
        Side::South => 1,
        Side::East => 2,
        Side::West => 3,
    });
    building.openings = by_side.into_iter().flat_map(|(_, o)| o).collect();
}

fn side_piece(building: &Building, side: Side, along: f32, span: f32, y: f32, height: f32, thickness: f32) -> Volume {
    let (half_w, half_d) = (building.width / 2.0, building.depth / 2.0);
    let (x, z, width, depth) = match side {
        Side::North => (building.x + along, building.z - half_d, span, thickness),
        Side::South => (building.x + along, building.z + half_d, span, thickness),
        Side::West => (building.x - half_w, building.z + along, thickness, span),
        Side::East => (building.x + half_w, building.z + along, thickness, span),
    };
    Volume { x, y, z, width, height, depth }
}

fn unique_sorted(mut values: Vec<f32>) -> Vec<f32> {
    values.sort_by(f32::total_cmp);
    values.dedup_by(|next, kept| (*next - *kept).abs() <= 0.001);
    values
}

/// Ring-shaped floor around an open atrium, a ramp in the atrium rising to
/// the ring, and optionally a low wall on every side of the ring.
fn add_second_floor<R: Rng + ?Sized>(
    parts: &mut BuildingParts,
    (floor_width, floor_depth): (f32, f32),
    config: &WorldConfig,
    ground_y: f32,
    rng: &mut R,
) {
    let y = ground_y + config.second_floor_height;
    let thickness = config.second_floor_thickness;
    parts.building.second_floor_y = Some(y);
    let b = &parts.building;

    let open_w = clamp(floor_width * uniform(rng, 0.38, 0.52), 3.0, floor_width - 2.0);
    let open_d = clamp(floor_depth * uniform(rng, 0.38, 0.52), 3.0, floor_depth - 2.0);
    let ring_x = ((floor_width - open_w) / 2.0).max(1.0);
    let ring_z = ((floor_depth - open_d) / 2.0).max(1.0);

    let slab = |x: f32, z: f32, width: f32, depth: f32| FloorSlab {
        building_id: b.id.clone(),
        x,
        z,
        width,
        depth,
        y,
        thickness,
    };
    parts.floors = vec![
        slab(b.x, b.z - (open_d + ring_z) / 2.0, floor_width, ring_z),
        slab(b.x, b.z + (open_d + ring_z) / 2.0, floor_width, ring_z),
        slab(b.x - (open_w + ring_x) / 2.0, b.z, ring_x, open_d),
        slab(b.x + (open_w + ring_x) / 2.0, b.z, ring_x, open_d),
    ];

    // The ramp runs along the atrium's longer edge. Its high end meets the
    // ring's inner edge; its low end stops short of the opposite ring so
    // nobody is lifted onto it from the ground.
    let along_x = open_w >= open_d;
    let (open_len, across) = if along_x { (open_w, open_d) } else { (open_d, open_w) };
    let length = open_len - RAMP_CLEARANCE;
    let sign = if chance(rng, 0.5) { 1.0 } else { -1.0 };
    let shift = sign * RAMP_CLEARANCE / 2.0;
    let (direction, x, z) = match (along_x, sign > 0.0) {
        (true, true) => (RampHeading::East, b.x + shift, b.z),
        (true, false) => (RampHeading::West, b.x + shift, b.z),
        (false, true) => (RampHeading::South, b.x, b.z + shift),
        (false, false) => (RampHeading::North, b.x, b.z + shift),
    };
    parts.ramp = Some(Ramp {
        building_id: b.id.clone(),
        x,
        z,
        width: (across - 0.5).min(3.0),
        length,
        direction,
        start_y: ground_y,
        end_y: y,
    });

    if !chance(rng, config.upper_wall_chance) {
        return;
    }
    let height = uniform(rng, 1.8, 2.6);
    let wall_y = y + height / 2.0;
    let wall_thickness = (b.wall_thickness * 0.8).max(0.8);
    let inner_w = (b.width - b.wall_thickness * 2.8).max(6.0);
    let inner_d = (b.depth - b.wall_thickness * 2.8).max(6.0);
    let gap = clamp(uniform(rng, 2.8, 4.2), 2.2, inner_w.min(inner_d) - 2.0);

    let piece_w = ((inner_w - gap) / 2.0).max(1.2);
    let piece_d = ((inner_d - gap) / 2.0).max(1.2);
    for z in [b.z - inner_d / 2.0, b.z + inner_d / 2.0] {
        for sign in [-1.0, 1.0] {
            parts.upper_walls.push(Volume {
                x: b.x + sign * (gap + piece_w) / 2.0,
                y: wall_y,
                z,
                width: piece_w,
                height,
                depth: wall_thickness,
            });
        }
    }
    for x in [b.x - inner_w / 2.0, b.x + inner_w / 2.0] {
        for sign in [-1.0, 1.0] {
            parts.upper_walls.push(Volume {
                x,
                y: wall_y,
                z: b.z + sign * (gap + piece_d) / 2.0,
                width: wall_thickness,
                height,
                depth: piece_d,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{WorldSeed, LAYOUT_STREAM};

    fn plot(width: f32, depth: f32) -> Plot {
        Plot {
            id: "b-0-0".into(),
            x: 0.0,
            z: 0.0,
            width,
            depth,
            lot_width: width + 4.0,
            lot_depth: depth + 4.0,
        }
    }

    #[test]
    fn test_every_building_has_a_door() {
        let mut rng = WorldSeed::new(11).rng(LAYOUT_STREAM);
        let config = WorldConfig::default();
        for _ in 0..50 {
            let parts = build(plot(16.0, 22.0), &config, 1.0, &mut rng);
            assert!(!parts.building.door_sides.is_empty());
            assert!(parts.building.openings.iter().any(|o| o.kind == OpeningKind::Door));
        }
    }

    #[test]
    fn test_openings_stay_inside_their_side() {
        let mut rng = WorldSeed::new(12).rng(LAYOUT_STREAM);
        let config = WorldConfig::default();
        for _ in 0..50 {
            let b = build(plot(34.0, 14.0), &config, 1.0, &mut rng).building;
            for o in &b.openings {
                let half = b.side_length(o.side) / 2.0;
                assert!(o.start >= -half + SIDE_PADDING - 1e-4);
                assert!(o.end <= half - SIDE_PADDING + 1e-4);
                assert!(o.top <= b.wall_height);
            }
        }
    }

    #[test]
    fn test_second_floor_comes_with_ramp() {
        let mut rng = WorldSeed::new(13).rng(LAYOUT_STREAM);
        let config = WorldConfig {
            second_floor_chance: 1.0,
            ..WorldConfig::default()
        };
        let parts = build(plot(30.0, 24.0), &config, 1.0, &mut rng);
        assert_eq!(parts.building.second_floor_y, Some(1.0 + config.second_floor_height));
        assert_eq!(parts.floors.len(), 4);
        let ramp = parts.ramp.expect("ramp");
        assert_eq!(ramp.start_y, 1.0);
        assert_eq!(ramp.end_y, 1.0 + config.second_floor_height);
    }

    #[test]
    fn test_small_building_has_no_second_floor() {
        let mut rng = WorldSeed::new(14).rng(LAYOUT_STREAM);
        let config = WorldConfig {
            second_floor_chance: 1.0,
            ..WorldConfig::default()
        };
        let parts = build(plot(10.0, 10.0), &config, 1.0, &mut rng);
        assert!(parts.building.second_floor_y.is_none());
        assert!(parts.ramp.is_none());
    }

    #[test]
    fn test_unique_sorted_merges_close_values() {
        assert_eq!(unique_sorted(vec![3.0, 1.0, 1.0005, 2.0]), vec![1.0, 2.0, 3.0]);
    }
}
