//! # Generation Config
//!
//! Every count, chance and size the generator uses. Loaded once as part of
//! the server config and clamped by [`WorldConfig::validated`]; the generator
//! never re-checks these values.

use serde::{Deserialize, Serialize};
use skirmish_shared::clamp;

/// Tunables for [`WorldGenerator`](crate::WorldGenerator).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Fixed seed. `None` picks one from the clock and logs it.
    pub seed: Option<u64>,

    // ---- city grid ----
    /// Street width (7..18).
    pub street_width: f32,
    /// Smallest block edge (12..40).
    pub min_block_size: f32,
    /// Margin between the city and the arena edge (>= 6).
    pub edge_margin: f32,
    /// Building count for an arena of `building_scale_baseline` half-size.
    pub buildings_count: u32,
    /// Scale the building count with arena area.
    pub auto_scale_buildings: bool,
    /// Half-size at which `buildings_count` applies unscaled.
    pub building_scale_baseline: f32,
    /// Upper bound on the scaled building count.
    pub max_buildings: u32,
    /// Width of the building-free perimeter band, in cells (0.3..3.2).
    pub perimeter_free_band_cells: f32,
    /// Minimum gap between the city and the outer wall ring.
    pub outer_wall_building_gap: f32,

    // ---- lot selection ----
    /// Base chance a lot stays empty.
    pub empty_lot_chance: f32,
    /// Extra empty chance for lots near the centre.
    pub center_empty_boost: f32,
    /// Radius of the cleared centre, in cells.
    pub center_clear_radius_cells: f32,
    /// Arenas at least this large get the wider cleared centre.
    pub guaranteed_open_space_min_half_size: f32,
    /// Wider cleared-centre radius, in cells.
    pub guaranteed_open_space_radius_cells: f32,
    /// Chance to merge two lots.
    pub merge2_chance: f32,
    /// Chance to merge three lots in an L.
    pub merge3_chance: f32,
    /// Chance to merge a 2x2 square.
    pub merge4_chance: f32,

    // ---- buildings ----
    /// Edge length at which a building counts as large.
    pub large_building_door_threshold: f32,
    /// Doors per long side of a large building (1..4).
    pub large_building_doors_per_side: u32,
    /// Maximum sides with doors (1..4).
    pub max_door_sides: u32,
    /// Chance two adjacent window slots merge (0..0.35).
    pub window_combine_chance: f32,
    /// Chance a large enough building gets a second floor.
    pub second_floor_chance: f32,
    /// Second floor height above ground level.
    pub second_floor_height: f32,
    /// Second floor slab thickness.
    pub second_floor_thickness: f32,
    /// Chance a second floor gets partial walls.
    pub upper_wall_chance: f32,

    // ---- street furniture ----
    /// Place crosses at street intersections.
    pub crossed_walls: bool,
    /// Chance per intersection.
    pub crossed_wall_chance: f32,
    /// Cross height.
    pub crossed_wall_height: f32,
    /// Chance a cross uses the long arm length.
    pub crossed_wall_long_chance: f32,
    /// Long arm multiplier.
    pub crossed_wall_long_multiplier: f32,
    /// Cap on crossed + street walls placed.
    pub pattern_wall_budget: u32,

    // ---- outer ring ----
    /// Build the inner ring of straight walls.
    pub outer_walls: bool,
    /// Below this half-size the ring is only built with `outer_walls_chance`.
    pub outer_walls_min_half_size: f32,
    /// Chance of a ring on small arenas.
    pub outer_walls_chance: f32,
    /// Ring thickness.
    pub outer_wall_thickness: f32,
    /// Ring height.
    pub outer_wall_height: f32,
    /// Corner gate size as a share of the half-size.
    pub outer_corner_opening_ratio: f32,
    /// Midpoint gate size as a share of the half-size.
    pub outer_middle_opening_ratio: f32,
    /// Minimum corner gate.
    pub outer_corner_opening_min: f32,
    /// Minimum midpoint gate.
    pub outer_middle_opening_min: f32,
    /// Cells next to the ring where no cross may stand.
    pub outer_cross_no_spawn_spaces: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            street_width: 10.0,
            min_block_size: 18.0,
            edge_margin: 8.0,
            buildings_count: 8,
            auto_scale_buildings: true,
            building_scale_baseline: 80.0,
            max_buildings: 140,
            perimeter_free_band_cells: 1.0,
            outer_wall_building_gap: 2.4,
            empty_lot_chance: 0.1,
            center_empty_boost: 0.55,
            center_clear_radius_cells: 0.85,
            guaranteed_open_space_min_half_size: 140.0,
            guaranteed_open_space_radius_cells: 1.2,
            merge2_chance: 0.34,
            merge3_chance: 0.22,
            merge4_chance: 0.16,
            large_building_door_threshold: 30.0,
            large_building_doors_per_side: 2,
            max_door_sides: 4,
            window_combine_chance: 0.08,
            second_floor_chance: 0.45,
            second_floor_height: 3.6,
            second_floor_thickness: 0.4,
            upper_wall_chance: 0.65,
            crossed_walls: true,
            crossed_wall_chance: 0.42,
            crossed_wall_height: 3.6,
            crossed_wall_long_chance: 0.18,
            crossed_wall_long_multiplier: 1.45,
            pattern_wall_budget: 48,
            outer_walls: true,
            outer_walls_min_half_size: 70.0,
            outer_walls_chance: 0.7,
            outer_wall_thickness: 2.2,
            outer_wall_height: 6.5,
            outer_corner_opening_ratio: 0.12,
            outer_middle_opening_ratio: 0.18,
            outer_corner_opening_min: 10.0,
            outer_middle_opening_min: 14.0,
            outer_cross_no_spawn_spaces: 2.0,
        }
    }
}

impl WorldConfig {
    /// Returns a copy with every value forced into its documented range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.street_width = clamp(self.street_width, 7.0, 18.0);
        self.min_block_size = clamp(self.min_block_size, 12.0, 40.0);
        self.edge_margin = self.edge_margin.max(6.0);
        self.buildings_count = self.buildings_count.max(4);
        self.building_scale_baseline = self.building_scale_baseline.max(20.0);
        self.max_buildings = self.max_buildings.max(self.buildings_count);
        self.perimeter_free_band_cells = clamp(self.perimeter_free_band_cells, 0.3, 3.2);
        self.outer_wall_building_gap = clamp(self.outer_wall_building_gap, 1.2, 14.0);

        self.empty_lot_chance = clamp(self.empty_lot_chance, 0.0, 0.75);
        self.center_empty_boost = clamp(self.center_empty_boost, 0.0, 0.95);
        self.center_clear_radius_cells = clamp(self.center_clear_radius_cells, 0.2, 2.4);
        self.guaranteed_open_space_min_half_size = self.guaranteed_open_space_min_half_size.max(20.0);
        self.guaranteed_open_space_radius_cells = clamp(self.guaranteed_open_space_radius_cells, 0.2, 3.2);
        self.merge2_chance = clamp(self.merge2_chance, 0.0, 1.0);
        self.merge3_chance = clamp(self.merge3_chance, 0.0, 1.0);
        self.merge4_chance = clamp(self.merge4_chance, 0.0, 1.0);

        self.large_building_door_threshold = clamp(self.large_building_door_threshold, 16.0, 80.0);
        self.large_building_doors_per_side = self.large_building_doors_per_side.clamp(1, 4);
        self.max_door_sides = self.max_door_sides.clamp(1, 4);
        self.window_combine_chance = clamp(self.window_combine_chance, 0.0, 0.35);
        self.second_floor_chance = clamp(self.second_floor_chance, 0.0, 1.0);
        self.second_floor_height = clamp(self.second_floor_height, 3.2, 4.4);
        self.second_floor_thickness = clamp(self.second_floor_thickness, 0.2, 0.8);
        self.upper_wall_chance = clamp(self.upper_wall_chance, 0.0, 1.0);

        self.crossed_wall_chance = clamp(self.crossed_wall_chance, 0.05, 1.0);
        self.crossed_wall_height = clamp(self.crossed_wall_height, 2.6, 5.6);
        self.crossed_wall_long_chance = clamp(self.crossed_wall_long_chance, 0.0, 1.0);
        self.crossed_wall_long_multiplier = clamp(self.crossed_wall_long_multiplier, 1.05, 2.6);

        self.outer_walls_min_half_size = self.outer_walls_min_half_size.max(20.0);
        self.outer_walls_chance = clamp(self.outer_walls_chance, 0.0, 1.0);
        self.outer_wall_thickness = clamp(self.outer_wall_thickness, 1.2, 4.8);
        self.outer_wall_height = clamp(self.outer_wall_height, 3.0, 10.0);
        self.outer_corner_opening_ratio = clamp(self.outer_corner_opening_ratio, 0.04, 0.38);
        self.outer_middle_opening_ratio = clamp(self.outer_middle_opening_ratio, 0.06, 0.55);
        self.outer_corner_opening_min = self.outer_corner_opening_min.max(8.0);
        self.outer_middle_opening_min = self.outer_middle_opening_min.max(10.0);
        self.outer_cross_no_spawn_spaces = clamp(self.outer_cross_no_spawn_spaces, 0.0, 6.0);
        self
    }
}
