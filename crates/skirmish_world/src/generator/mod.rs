//! # World Generator
//!
//! Builds a city-like arena from a [`WorldSeed`] and a [`WorldConfig`]:
//!
//! 1. Size a grid of blocks separated by streets; grow the arena so the
//!    city fits inside the outer wall ring.
//! 2. Pick building lots, leaving the centre open.
//! 3. Merge neighbouring lots into larger footprints.
//! 4. Build each building (doors, windows, wall pieces, maybe a second
//!    floor with a ramp).
//! 5. Add the boundary, the gated outer ring, street walls and crosses.
//!
//! Every random draw comes from one ChaCha stream, so the same seed and
//! config always give the same layout.

mod building;
mod city;
mod walls;

use crate::config::WorldConfig;
use crate::error::WorldResult;
use crate::layout::{StreetGrid, Wall, WorldLayout};
use crate::seed::{chance, WorldSeed, LAYOUT_STREAM};
use building::Plot;
use city::CityPlan;
use rand::seq::SliceRandom;
use skirmish_shared::unix_millis;
use tracing::{debug, info};
use walls::{OuterRing, Zone};

/// Deterministic arena generator.
#[derive(Clone, Debug)]
pub struct WorldGenerator {
    seed: WorldSeed,
    half_size: f32,
    ground_y: f32,
    config: WorldConfig,
}

impl WorldGenerator {
    /// Creates a generator for an arena of (at least) `half_size`.
    #[must_use]
    pub fn new(seed: WorldSeed, half_size: f32, ground_y: f32, config: WorldConfig) -> Self {
        Self {
            seed,
            half_size: half_size.max(20.0),
            ground_y,
            config,
        }
    }

    /// Seed in use.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Generates and validates a layout stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated layout is inconsistent.
    pub fn generate(&self) -> WorldResult<WorldLayout> {
        self.generate_at(unix_millis())
    }

    /// Generates and validates a layout stamped with `generated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated layout is inconsistent.
    pub fn generate_at(&self, generated_at: u64) -> WorldResult<WorldLayout> {
        let config = &self.config;
        let mut rng = self.seed.rng(LAYOUT_STREAM);

        let ring_enabled = config.outer_walls
            && (self.half_size >= config.outer_walls_min_half_size || chance(&mut rng, config.outer_walls_chance));
        let plan = CityPlan::new(config, self.half_size, ring_enabled);
        let half = plan.half_size;
        debug!(
            half_size = half,
            blocks_x = plan.blocks_x,
            blocks_z = plan.blocks_z,
            block_width = plan.block_width,
            "city grid sized"
        );

        // Lots and buildings.
        let lots = plan.select_cells(config, &mut rng);
        let groups = plan.merge_groups(&lots, config, &mut rng);

        let mut buildings = Vec::new();
        let mut second_floors = Vec::new();
        let mut upper_walls = Vec::new();
        let mut ramps = Vec::new();
        let (street, bw, bd) = (plan.street_width, plan.block_width, plan.block_depth);
        let city_min = plan.city_min();

        for (group_index, group) in groups.iter().enumerate() {
            let parts = city::footprints(group, &mut rng);
            let merged = parts.len() > 1 || group.len() > 1;
            for (part_index, footprint) in parts.iter().enumerate() {
                let (span_x, span_z) = footprint.span();
                let lot_width = span_x as f32 * bw + (span_x - 1) as f32 * street;
                let lot_depth = span_z as f32 * bd + (span_z - 1) as f32 * street;
                let plot = Plot {
                    id: format!("b-{group_index}-{part_index}"),
                    x: city_min + street + footprint.min_gx as f32 * (bw + street) + lot_width / 2.0,
                    z: city_min + street + footprint.min_gz as f32 * (bd + street) + lot_depth / 2.0,
                    width: city::building_extent(lot_width, merged, &mut rng),
                    depth: city::building_extent(lot_depth, merged, &mut rng),
                    lot_width,
                    lot_depth,
                };
                let built = building::build(plot, config, self.ground_y, &mut rng);
                second_floors.extend(built.floors);
                upper_walls.extend(built.upper_walls);
                ramps.extend(built.ramp);
                buildings.push(built.building);
            }
        }

        // Free-standing walls.
        let vertical = plan.vertical_centers();
        let horizontal = plan.horizontal_centers();
        let span_min = city_min + street;
        let span_max = city_min + plan.usable - street;
        let mut street_walls = walls::street_walls(&horizontal, span_min, span_max, street, true);
        street_walls.extend(walls::street_walls(&vertical, span_min, span_max, street, false));

        let clear_radius = plan.clear_radius_cells(config) * bw.max(bd);
        let ring = ring_enabled.then(|| OuterRing::new(half, config, bw, bd, street));
        let (mut shared_zones, cross_zones) = match &ring {
            Some(ring) => ring.exclusion_zones(half, config, street, plan.grid_step()),
            None => (Vec::new(), Vec::new()),
        };
        shared_zones.push(Zone::around(0.0, 0.0, clear_radius));
        street_walls.retain(|wall| !shared_zones.iter().any(|zone| zone.touches(&wall.volume)));

        let mut all_zones = shared_zones;
        all_zones.extend(cross_zones);
        let city_center = city_min + plan.usable / 2.0;
        let crosses = walls::cross_walls(
            &vertical,
            &horizontal,
            street,
            config,
            (city_center, city_center),
            clear_radius,
            &all_zones,
            &mut rng,
        );

        let mut layout_walls: Vec<Wall> = walls::boundary_walls(half);
        if let Some(ring) = &ring {
            layout_walls.extend(ring.walls(half));
        }
        street_walls.shuffle(&mut rng);
        layout_walls.extend(
            crosses
                .into_iter()
                .chain(street_walls)
                .take(config.pattern_wall_budget as usize),
        );

        let layout = WorldLayout {
            generated_at,
            seed: self.seed.value(),
            half_size: half,
            streets: StreetGrid {
                street_width: street,
                blocks_x: plan.blocks_x as u32,
                blocks_z: plan.blocks_z as u32,
                vertical_centers: vertical,
                horizontal_centers: horizontal,
            },
            walls: layout_walls,
            buildings,
            second_floors,
            upper_walls,
            ramps,
        };
        layout.validate()?;

        info!(
            seed = self.seed.value(),
            half_size = layout.half_size,
            buildings = layout.buildings.len(),
            walls = layout.walls.len(),
            ramps = layout.ramps.len(),
            "world generated"
        );
        Ok(layout)
    }
}
