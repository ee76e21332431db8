//! City grid: sizing the blocks, choosing which lots get a building and
//! merging neighbouring lots into larger footprints.

use super::walls::OuterRing;
use crate::config::WorldConfig;
use crate::seed::{chance, uniform};
use rand::seq::SliceRandom;
use rand::Rng;
use skirmish_shared::clamp;
use std::collections::BTreeSet;

/// Lot coordinates `(gx, gz)`.
pub(crate) type Cell = (i32, i32);

/// Expansion attempts to fit the city inside the outer ring.
const RING_FIT_ATTEMPTS: usize = 4;

/// Resolved grid dimensions for one arena.
#[derive(Clone, Debug)]
pub(crate) struct CityPlan {
    pub half_size: f32,
    pub usable: f32,
    pub street_width: f32,
    pub block_width: f32,
    pub block_depth: f32,
    pub blocks_x: i32,
    pub blocks_z: i32,
    pub target_buildings: usize,
}

impl CityPlan {
    /// Sizes the grid. The arena grows past `configured_half` to reserve a
    /// perimeter band and, with a ring, to keep the city inside it.
    pub fn new(config: &WorldConfig, configured_half: f32, ring_enabled: bool) -> Self {
        let baseline = config.building_scale_baseline;
        let area_scale = clamp((configured_half * configured_half) / (baseline * baseline), 0.25, 16.0);
        let base = config.buildings_count as usize;
        let requested = if config.auto_scale_buildings {
            ((base as f32 * area_scale).round() as usize).clamp(4, config.max_buildings as usize)
        } else {
            base
        };

        let street = config.street_width;
        let min_block = config.min_block_size;
        let reserve = (min_block + street * 0.5) * config.perimeter_free_band_cells;
        let mut half = configured_half + reserve;
        let mut margin = config.edge_margin + reserve;

        let mut blocks_x = ((requested as f32).sqrt().round() as i32).max(2);
        let mut blocks_z = ((requested as f32 / blocks_x as f32).ceil() as i32).max(2);

        let sizes = |half: f32, margin: f32, bx: i32, bz: i32| {
            let usable = half * 2.0 - margin * 2.0;
            let bw = (usable - (bx + 1) as f32 * street) / bx as f32;
            let bd = (usable - (bz + 1) as f32 * street) / bz as f32;
            (usable, bw, bd)
        };

        let (mut usable, mut bw, mut bd) = sizes(half, margin, blocks_x, blocks_z);
        while (bw < min_block || bd < min_block) && (blocks_x > 2 || blocks_z > 2) {
            if bw < bd && blocks_x > 2 {
                blocks_x -= 1;
            } else if blocks_z > 2 {
                blocks_z -= 1;
            } else {
                blocks_x -= 1;
            }
            (usable, bw, bd) = sizes(half, margin, blocks_x, blocks_z);
        }

        if ring_enabled {
            for _ in 0..RING_FIT_ATTEMPTS {
                let ring = OuterRing::new(half, config, bw.max(min_block), bd.max(min_block), street);
                let needed = usable / 2.0 + config.outer_wall_building_gap - ring.wall_abs;
                if needed <= 0.0 {
                    break;
                }
                half += needed + 1.0;
                margin += needed + 1.0;
                (usable, bw, bd) = sizes(half, margin, blocks_x, blocks_z);
            }
        }

        Self {
            half_size: half,
            usable,
            street_width: street,
            block_width: bw.max(min_block),
            block_depth: bd.max(min_block),
            blocks_x,
            blocks_z,
            target_buildings: requested.min((blocks_x * blocks_z) as usize),
        }
    }

    /// Western (and northern) edge of the city.
    pub fn city_min(&self) -> f32 {
        -self.usable / 2.0
    }

    /// Centre lines of the north-south streets.
    pub fn vertical_centers(&self) -> Vec<f32> {
        (0..=self.blocks_x)
            .map(|g| self.city_min() + g as f32 * (self.block_width + self.street_width) + self.street_width / 2.0)
            .collect()
    }

    /// Centre lines of the east-west streets.
    pub fn horizontal_centers(&self) -> Vec<f32> {
        (0..=self.blocks_z)
            .map(|g| self.city_min() + g as f32 * (self.block_depth + self.street_width) + self.street_width / 2.0)
            .collect()
    }

    /// Distance between neighbouring street centre lines.
    pub fn grid_step(&self) -> (f32, f32) {
        (self.block_width + self.street_width, self.block_depth + self.street_width)
    }

    fn contains(&self, (gx, gz): Cell) -> bool {
        gx >= 0 && gx < self.blocks_x && gz >= 0 && gz < self.blocks_z
    }

    fn grid_center(&self) -> (f32, f32) {
        ((self.blocks_x - 1) as f32 / 2.0, (self.blocks_z - 1) as f32 / 2.0)
    }

    /// 0 at the grid centre, 1 at the corners.
    fn norm_center_distance(&self, (gx, gz): Cell) -> f32 {
        let (cx, cz) = self.grid_center();
        let dx = (gx as f32 - cx).abs() / (self.blocks_x as f32 / 2.0).max(1.0);
        let dz = (gz as f32 - cz).abs() / (self.blocks_z as f32 / 2.0).max(1.0);
        clamp(dx.hypot(dz) / std::f32::consts::SQRT_2, 0.0, 1.0)
    }

    /// Radius, in cells, of the building-free centre.
    pub fn clear_radius_cells(&self, config: &WorldConfig) -> f32 {
        if self.half_size >= config.guaranteed_open_space_min_half_size {
            config.center_clear_radius_cells.max(config.guaranteed_open_space_radius_cells)
        } else {
            config.center_clear_radius_cells
        }
    }

    /// Picks the lots that get a building. Centre lots are always empty;
    /// lots near the centre are empty more often.
    pub fn select_cells<R: Rng + ?Sized>(&self, config: &WorldConfig, rng: &mut R) -> BTreeSet<Cell> {
        let (cx, cz) = self.grid_center();
        let clear_radius = self.clear_radius_cells(config);
        let target = self.target_buildings;

        let mut available = BTreeSet::new();
        let mut cleared = BTreeSet::new();
        for gz in 0..self.blocks_z {
            for gx in 0..self.blocks_x {
                let cell = (gx, gz);
                if (gx as f32 - cx).hypot(gz as f32 - cz) <= clear_radius {
                    cleared.insert(cell);
                    continue;
                }
                let middle = 1.0 - self.norm_center_distance(cell);
                let skip = clamp(config.empty_lot_chance + middle * config.center_empty_boost, 0.0, 0.97);
                if rng.gen::<f32>() > skip {
                    available.insert(cell);
                }
            }
        }

        if available.len() > target {
            let mut ranked: Vec<(Cell, f32)> = available
                .iter()
                .map(|&cell| (cell, 1.0 - self.norm_center_distance(cell) + rng.gen::<f32>() * 0.15))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            let excess = available.len() - target;
            for (cell, _) in ranked.into_iter().take(excess) {
                available.remove(&cell);
            }
        }

        let min_cells = (target * 45 / 100).min(target).max(4);
        if available.len() < min_cells {
            let mut candidates: Vec<(Cell, f32)> = (0..self.blocks_z)
                .flat_map(|gz| (0..self.blocks_x).map(move |gx| (gx, gz)))
                .filter(|cell| !cleared.contains(cell) && !available.contains(cell))
                .map(|cell| (cell, self.norm_center_distance(cell) + rng.gen::<f32>() * 0.1))
                .collect();
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (cell, _) in candidates {
                if available.len() >= min_cells {
                    break;
                }
                available.insert(cell);
            }
        }

        available
    }

    /// Groups free lots into merged shapes: 2x2 squares, L-shapes, pairs or
    /// single lots. Every available lot ends up in exactly one group.
    pub fn merge_groups<R: Rng + ?Sized>(
        &self,
        available: &BTreeSet<Cell>,
        config: &WorldConfig,
        rng: &mut R,
    ) -> Vec<Vec<Cell>> {
        let mut claimed: BTreeSet<Cell> = BTreeSet::new();
        let mut roots: Vec<Cell> = available.iter().copied().collect();
        roots.shuffle(rng);

        let mut groups = Vec::new();
        for root in roots {
            if claimed.contains(&root) {
                continue;
            }
            let is_free = |cell: Cell| self.contains(cell) && available.contains(&cell) && !claimed.contains(&cell);
            let group = self.pick_merge(root, is_free, config, rng);
            claimed.extend(group.iter().copied());
            groups.push(group);
        }
        groups
    }

    fn pick_merge<R: Rng + ?Sized>(
        &self,
        (gx, gz): Cell,
        is_free: impl Fn(Cell) -> bool,
        config: &WorldConfig,
        rng: &mut R,
    ) -> Vec<Cell> {
        let mut squares = Vec::new();
        let mut ells: Vec<Vec<Cell>> = Vec::new();
        let mut seen: BTreeSet<Vec<Cell>> = BTreeSet::new();

        for ax in [gx - 1, gx] {
            for az in [gz - 1, gz] {
                let square = [(ax, az), (ax + 1, az), (ax, az + 1), (ax + 1, az + 1)];
                if !square.iter().all(|&c| self.contains(c)) {
                    continue;
                }
                if square.iter().all(|&c| is_free(c)) {
                    squares.push(square.to_vec());
                }
                for missing in 0..square.len() {
                    let option: Vec<Cell> = square
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| i != missing)
                        .map(|(_, &c)| c)
                        .collect();
                    if !option.contains(&(gx, gz)) || !option.iter().all(|&c| is_free(c)) {
                        continue;
                    }
                    let mut signature = option.clone();
                    signature.sort_unstable();
                    if seen.insert(signature) {
                        ells.push(option);
                    }
                }
            }
        }

        let pairs: Vec<Vec<Cell>> = [(gx + 1, gz), (gx - 1, gz), (gx, gz + 1), (gx, gz - 1)]
            .into_iter()
            .filter(|&c| is_free(c))
            .map(|c| vec![(gx, gz), c])
            .collect();

        for (options, merge_chance) in [
            (&squares, config.merge4_chance),
            (&ells, config.merge3_chance),
            (&pairs, config.merge2_chance),
        ] {
            if !options.is_empty() && chance(rng, merge_chance) {
                if let Some(pick) = options.choose(rng) {
                    return pick.clone();
                }
            }
        }
        vec![(gx, gz)]
    }
}

/// Inclusive lot range a single building covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Footprint {
    pub min_gx: i32,
    pub max_gx: i32,
    pub min_gz: i32,
    pub max_gz: i32,
}

impl Footprint {
    fn bounding(cells: &[Cell]) -> Self {
        Self {
            min_gx: cells.iter().map(|c| c.0).min().unwrap_or(0),
            max_gx: cells.iter().map(|c| c.0).max().unwrap_or(0),
            min_gz: cells.iter().map(|c| c.1).min().unwrap_or(0),
            max_gz: cells.iter().map(|c| c.1).max().unwrap_or(0),
        }
    }

    /// Lots spanned along X and Z.
    pub fn span(&self) -> (i32, i32) {
        (self.max_gx - self.min_gx + 1, self.max_gz - self.min_gz + 1)
    }
}

/// Rectangular footprints for a merged group. An L-shape becomes a pair
/// plus a single lot; every other shape is its bounding box.
pub(crate) fn footprints<R: Rng + ?Sized>(cells: &[Cell], rng: &mut R) -> Vec<Footprint> {
    if cells.len() != 3 {
        return vec![Footprint::bounding(cells)];
    }
    let shares_x = |c: &Cell| cells.iter().filter(|o| o.0 == c.0).count();
    let shares_z = |c: &Cell| cells.iter().filter(|o| o.1 == c.1).count();
    let Some(pivot) = cells.iter().find(|c| shares_x(c) >= 2 && shares_z(c) >= 2) else {
        return vec![Footprint::bounding(cells)];
    };

    let row: Vec<Cell> = cells.iter().copied().filter(|c| c.1 == pivot.1).collect();
    let column: Vec<Cell> = cells.iter().copied().filter(|c| c.0 == pivot.0).collect();
    let pair = if row.len() >= 2 && (column.len() < 2 || chance(rng, 0.5)) { row } else { column };

    let mut result = vec![Footprint::bounding(&pair)];
    if let Some(&rest) = cells.iter().find(|c| !pair.contains(c)) {
        result.push(Footprint::bounding(&[rest]));
    }
    result
}

/// Building size for a lot: a random share of it, never below 12 and
/// never closer than 2.2 to its edge unless the lot is tiny.
pub(crate) fn building_extent<R: Rng + ?Sized>(lot: f32, merged: bool, rng: &mut R) -> f32 {
    let (lo, hi) = if merged { (0.84, 0.95) } else { (0.68, 0.85) };
    clamp(lot * uniform(rng, lo, hi), 12.0, (lot - 2.2).max(13.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{WorldSeed, LAYOUT_STREAM};

    #[test]
    fn test_default_plan_has_sane_blocks() {
        let config = WorldConfig::default();
        let plan = CityPlan::new(&config, 80.0, true);
        assert!(plan.half_size > 80.0);
        assert!(plan.block_width >= config.min_block_size);
        assert!(plan.blocks_x >= 2 && plan.blocks_z >= 2);
        assert_eq!(plan.vertical_centers().len(), plan.blocks_x as usize + 1);
    }

    #[test]
    fn test_center_lots_stay_empty() {
        let config = WorldConfig::default();
        let plan = CityPlan::new(&config, 160.0, true);
        let mut rng = WorldSeed::new(5).rng(LAYOUT_STREAM);
        let cells = plan.select_cells(&config, &mut rng);
        let (cx, cz) = plan.grid_center();
        let radius = plan.clear_radius_cells(&config);
        for &(gx, gz) in &cells {
            assert!((gx as f32 - cx).hypot(gz as f32 - cz) > radius);
        }
    }

    #[test]
    fn test_merge_claims_each_lot_once() {
        let config = WorldConfig {
            merge2_chance: 1.0,
            merge3_chance: 1.0,
            merge4_chance: 1.0,
            ..WorldConfig::default()
        };
        let plan = CityPlan::new(&config, 160.0, true);
        let mut rng = WorldSeed::new(6).rng(LAYOUT_STREAM);
        let cells = plan.select_cells(&config, &mut rng);
        let groups = plan.merge_groups(&cells, &config, &mut rng);
        let mut seen = BTreeSet::new();
        for group in &groups {
            for cell in group {
                assert!(cells.contains(cell));
                assert!(seen.insert(*cell));
            }
        }
        assert_eq!(seen.len(), cells.len());
    }

    #[test]
    fn test_l_shape_splits_into_pair_and_single() {
        let mut rng = WorldSeed::new(7).rng(LAYOUT_STREAM);
        let parts = footprints(&[(0, 0), (1, 0), (0, 1)], &mut rng);
        assert_eq!(parts.len(), 2);
        let lots: i32 = parts.iter().map(|f| f.span().0 * f.span().1).sum();
        assert_eq!(lots, 3);
    }

    #[test]
    fn test_building_extent_fits_lot() {
        let mut rng = WorldSeed::new(8).rng(LAYOUT_STREAM);
        for lot in [12.0, 14.0, 20.0, 48.0] {
            for merged in [false, true] {
                let size = building_extent(lot, merged, &mut rng);
                assert!(size >= 12.0 && size <= lot);
            }
        }
    }
}
