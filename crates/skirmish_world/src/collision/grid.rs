//! Uniform XZ bucket grid over box indices.
//!
//! Every box is registered in each cell its footprint touches. A query
//! returns candidate indices only; the caller still runs the exact test.

use super::aabb::Aabb;

/// Broadphase grid covering `[-extent, extent]` on both axes.
#[derive(Clone, Debug)]
pub struct BoxGrid {
    cell_size: f32,
    origin: f32,
    cols: i32,
    cells: Vec<Vec<u32>>,
}

impl BoxGrid {
    /// Builds the grid for `boxes`. Points outside the extent fall into the
    /// nearest edge cell, where out-of-range boxes are registered too.
    #[must_use]
    pub fn build(boxes: &[Aabb], extent: f32, cell_size: f32) -> Self {
        let cell_size = cell_size.max(1.0);
        let cols = ((extent * 2.0) / cell_size).ceil().max(1.0) as i32;
        let mut grid = Self {
            cell_size,
            origin: -extent,
            cols,
            cells: vec![Vec::new(); (cols * cols) as usize],
        };
        for (index, aabb) in boxes.iter().enumerate() {
            let (x0, z0) = grid.cell_of(aabb.min.x, aabb.min.z);
            let (x1, z1) = grid.cell_of(aabb.max.x, aabb.max.z);
            for cz in z0..=z1 {
                for cx in x0..=x1 {
                    let slot = grid.slot(cx, cz);
                    grid.cells[slot].push(index as u32);
                }
            }
        }
        grid
    }

    #[inline]
    fn cell_of(&self, x: f32, z: f32) -> (i32, i32) {
        let cx = ((x - self.origin) / self.cell_size).floor() as i32;
        let cz = ((z - self.origin) / self.cell_size).floor() as i32;
        (cx.clamp(0, self.cols - 1), cz.clamp(0, self.cols - 1))
    }

    #[inline]
    fn slot(&self, cx: i32, cz: i32) -> usize {
        (cz * self.cols + cx) as usize
    }

    /// Candidates whose footprint may contain `(x, z)`.
    #[must_use]
    pub fn at(&self, x: f32, z: f32) -> &[u32] {
        let (cx, cz) = self.cell_of(x, z);
        &self.cells[self.slot(cx, cz)]
    }

    /// Calls `visit` with every candidate near a circle until it returns `true`.
    ///
    /// A box spanning several cells may be visited more than once.
    pub fn any_near(&self, x: f32, z: f32, radius: f32, mut visit: impl FnMut(u32) -> bool) -> bool {
        let (x0, z0) = self.cell_of(x - radius, z - radius);
        let (x1, z1) = self.cell_of(x + radius, z + radius);
        for cz in z0..=z1 {
            for cx in x0..=x1 {
                if self.cells[self.slot(cx, cz)].iter().any(|&i| visit(i)) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_shared::Vec3;

    #[test]
    fn test_box_registered_in_every_touched_cell() {
        let boxes = [Aabb::from_center(Vec3::ZERO, 20.0, 2.0, 2.0)];
        let grid = BoxGrid::build(&boxes, 40.0, 8.0);
        assert_eq!(grid.at(-9.0, 0.0), &[0]);
        assert_eq!(grid.at(9.0, 0.0), &[0]);
        assert!(grid.at(0.0, 20.0).is_empty());
    }

    #[test]
    fn test_outside_points_clamp_to_edge() {
        let boxes = [Aabb::from_center(Vec3::new(45.0, 0.0, 0.0), 4.0, 2.0, 4.0)];
        let grid = BoxGrid::build(&boxes, 40.0, 8.0);
        assert_eq!(grid.at(100.0, 0.0), &[0]);
    }
}
