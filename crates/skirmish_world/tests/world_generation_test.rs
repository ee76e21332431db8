//! # World Generation Tests
//!
//! Verifies that generated arenas are reproducible, internally consistent
//! and actually playable: actors can spawn, move and reach upper floors.

use skirmish_shared::Vec3;
use skirmish_world::{
    CollisionIndex, OpeningKind, Side, WallKind, WorldConfig, WorldGenerator, WorldLayout, WorldSeed,
    SIMULATION_STREAM,
};

const GROUND_Y: f32 = 1.0;

fn generate(seed: u64, half_size: f32, config: WorldConfig) -> WorldLayout {
    WorldGenerator::new(WorldSeed::new(seed), half_size, GROUND_Y, config)
        .generate_at(0)
        .expect("layout should validate")
}

/// Test: Same seed and config give an identical layout.
#[test]
fn test_same_seed_same_layout() {
    let a = generate(42, 80.0, WorldConfig::default());
    let b = generate(42, 80.0, WorldConfig::default());
    assert_eq!(a, b);
}

/// Test: Different seeds give different layouts.
#[test]
fn test_different_seed_different_layout() {
    let a = generate(1, 120.0, WorldConfig::default());
    let b = generate(2, 120.0, WorldConfig::default());
    assert_ne!(a.buildings, b.buildings);
}

/// Test: Layouts validate across many seeds and arena sizes.
#[test]
fn test_layouts_validate_across_seeds() {
    for seed in 0..24 {
        for half_size in [40.0, 80.0, 160.0] {
            let layout = generate(seed, half_size, WorldConfig::default());
            assert!(layout.validate().is_ok(), "seed {seed} half {half_size}");
            assert!(layout.half_size >= half_size);
            if half_size >= 80.0 {
                assert!(!layout.buildings.is_empty(), "seed {seed} produced no buildings");
            }
        }
    }
}

/// Test: The boundary encloses the arena and the outer ring leaves gates.
#[test]
fn test_boundary_and_outer_ring() {
    let layout = generate(7, 120.0, WorldConfig::default());
    let boundary = layout.walls.iter().filter(|w| w.kind == WallKind::Boundary).count();
    assert_eq!(boundary, 4);

    let ring: Vec<_> = layout.walls.iter().filter(|w| w.kind == WallKind::OuterStraight).collect();
    assert!(!ring.is_empty());
    // The midpoint of each side stays open.
    for wall in ring {
        let v = wall.volume;
        let (lo, hi) = if v.width > v.depth {
            (v.x - v.width / 2.0, v.x + v.width / 2.0)
        } else {
            (v.z - v.depth / 2.0, v.z + v.depth / 2.0)
        };
        assert!(hi < 0.0 || lo > 0.0, "ring wall covers a side midpoint");
    }
}

/// Test: Pattern walls respect the configured budget.
#[test]
fn test_pattern_wall_budget() {
    let config = WorldConfig {
        pattern_wall_budget: 3,
        ..WorldConfig::default()
    };
    let layout = generate(9, 160.0, config);
    let pattern = layout
        .walls
        .iter()
        .filter(|w| matches!(w.kind, WallKind::StreetWall | WallKind::CrossPattern))
        .count();
    assert!(pattern <= 3);
}

/// Test: Every building has a door reaching the ground, and doors are not
/// blocked by sills.
#[test]
fn test_every_building_is_enterable() {
    for seed in 0..12 {
        let layout = generate(seed, 100.0, WorldConfig::default());
        for building in &layout.buildings {
            let doors: Vec<_> = building.openings.iter().filter(|o| o.kind == OpeningKind::Door).collect();
            assert!(!doors.is_empty(), "{} has no door", building.id);
            assert!(doors.iter().all(|d| d.bottom == 0.0));
        }
    }
}

/// Test: Wall segments never fill an opening.
#[test]
fn test_segments_leave_openings_clear() {
    let layout = generate(3, 100.0, WorldConfig::default());
    for building in &layout.buildings {
        for opening in &building.openings {
            let along = (opening.start + opening.end) / 2.0;
            let y = (opening.bottom + opening.top) / 2.0;
            let (x, z) = match opening.side {
                Side::North => (building.x + along, building.z - building.depth / 2.0),
                Side::South => (building.x + along, building.z + building.depth / 2.0),
                Side::West => (building.x - building.width / 2.0, building.z + along),
                Side::East => (building.x + building.width / 2.0, building.z + along),
            };
            let filled = building.wall_segments.iter().any(|s| {
                (x - s.x).abs() < s.width / 2.0 && (z - s.z).abs() < s.depth / 2.0 && (y - s.y).abs() < s.height / 2.0
            });
            assert!(!filled, "{} opening centre is walled in", building.id);
        }
    }
}

/// Test: Spawn points are never inside geometry.
#[test]
fn test_spawn_points_are_free() {
    let layout = generate(11, 80.0, WorldConfig::default());
    let index = CollisionIndex::build(&layout, GROUND_Y, 1.0, 1.8);
    let mut rng = WorldSeed::new(11).rng(SIMULATION_STREAM);
    for _ in 0..100 {
        let spawn = index.find_spawn_point(&mut rng);
        assert!(index.is_free_for_actor(spawn), "spawned inside geometry at {spawn:?}");
    }
}

/// Test: Random walks never end inside geometry or outside the arena.
#[test]
fn test_movement_never_ends_blocked() {
    let layout = generate(5, 80.0, WorldConfig::default());
    let index = CollisionIndex::build(&layout, GROUND_Y, 1.0, 1.8);
    let mut rng = WorldSeed::new(5).rng(SIMULATION_STREAM);
    let limit = index.half_size() - 1.0;

    for walker in 0..8 {
        let mut position = index.find_spawn_point(&mut rng);
        let heading = walker as f32 * 0.8;
        for step in 0..400 {
            let angle = heading + (step as f32 * 0.05).sin();
            let desired = position + Vec3::new(angle.cos(), 0.0, angle.sin()) * 0.6;
            position = index.resolve_movement(position, desired);
            assert!(index.is_free_for_actor(position));
            assert!(position.x.abs() <= limit && position.z.abs() <= limit);
        }
    }
}

/// Test: Upper floors are reachable by walking up their ramp.
#[test]
fn test_second_floor_reachable_by_ramp() {
    let config = WorldConfig {
        second_floor_chance: 1.0,
        ..WorldConfig::default()
    };
    let layout = generate(21, 120.0, config);
    let index = CollisionIndex::build(&layout, GROUND_Y, 1.0, 1.8);
    assert!(!layout.ramps.is_empty());

    for ramp in &layout.ramps {
        let floor_y = ramp.end_y;
        // Walk the ramp centre line from the low end to the high end.
        let (ux, uz) = match ramp.direction.degrees() {
            0 => (1.0, 0.0),
            90 => (0.0, 1.0),
            180 => (-1.0, 0.0),
            _ => (0.0, -1.0),
        };
        let mut y = GROUND_Y;
        let steps = 40;
        for i in 0..=steps {
            let along = -ramp.length / 2.0 + ramp.length * i as f32 / steps as f32;
            y = index.terrain_height_at(ramp.x + ux * along, ramp.z + uz * along, y);
        }
        assert!((y - floor_y).abs() < 1e-3, "ramp of {} tops out at {y}", ramp.building_id);

        // One step further lands on the ring.
        let beyond = ramp.length / 2.0 + 0.5;
        let on_ring = index.terrain_height_at(ramp.x + ux * beyond, ramp.z + uz * beyond, y);
        assert!((on_ring - floor_y).abs() < 1e-3);
    }
}

/// Test: A thin actor walked along every building wall is blocked everywhere
/// except inside door openings. Windows stop actors through their sills.
#[test]
fn test_building_walls_have_no_gaps_outside_doors() {
    const STEP: f32 = 0.25;
    const THIN_RADIUS: f32 = 0.3;

    for seed in [2, 6, 19, 33] {
        let layout = generate(seed, 120.0, WorldConfig::default());
        let index = CollisionIndex::build(&layout, GROUND_Y, 1.0, 1.8);
        for building in &layout.buildings {
            for side in Side::ALL {
                let length = building.side_length(side);
                let doors: Vec<_> = building
                    .openings
                    .iter()
                    .filter(|o| o.side == side && o.kind == OpeningKind::Door)
                    .collect();
                let samples = (length / STEP) as usize;
                for i in 0..=samples {
                    let along = -length / 2.0 + i as f32 * STEP;
                    if doors.iter().any(|d| along >= d.start && along <= d.end) {
                        continue;
                    }
                    let (x, z) = match side {
                        Side::North => (building.x + along, building.z - building.depth / 2.0),
                        Side::South => (building.x + along, building.z + building.depth / 2.0),
                        Side::West => (building.x - building.width / 2.0, building.z + along),
                        Side::East => (building.x + building.width / 2.0, building.z + along),
                    };
                    assert!(
                        index.is_blocked_for_actor(Vec3::new(x, GROUND_Y, z), THIN_RADIUS, 1.8),
                        "seed {seed}: gap in {} {side:?} wall at {along:.2}",
                        building.id
                    );
                }
            }
        }
    }
}
