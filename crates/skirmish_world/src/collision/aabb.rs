//! Box and rectangle primitives used by the collision index.

use crate::layout::Volume;
use skirmish_shared::{clamp, Vec3};

/// Axis-aligned bounding box stored as min/max corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box from a centre and full extents.
    #[must_use]
    pub fn from_center(center: Vec3, width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width / 2.0, height / 2.0, depth / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box covering a layout volume.
    #[must_use]
    pub fn from_volume(volume: &Volume) -> Self {
        Self::from_center(
            Vec3::new(volume.x, volume.y, volume.z),
            volume.width,
            volume.height,
            volume.depth,
        )
    }

    /// Inclusive point containment.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Open overlap with the vertical band `[bottom, top]`.
    #[inline]
    #[must_use]
    pub fn overlaps_band(&self, bottom: f32, top: f32) -> bool {
        top > self.min.y && bottom < self.max.y
    }

    /// Closest-point test of an XZ circle against the box footprint.
    #[inline]
    #[must_use]
    pub fn intersects_circle_xz(&self, x: f32, z: f32, radius: f32) -> bool {
        let dx = x - clamp(x, self.min.x, self.max.x);
        let dz = z - clamp(z, self.min.z, self.max.z);
        dx * dx + dz * dz <= radius * radius
    }
}

/// Horizontal walkable rectangle at height `y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatRect {
    /// Minimum X.
    pub min_x: f32,
    /// Maximum X.
    pub max_x: f32,
    /// Minimum Z.
    pub min_z: f32,
    /// Maximum Z.
    pub max_z: f32,
    /// Surface height.
    pub y: f32,
}

impl FlatRect {
    /// Rectangle from a centre and extents.
    #[must_use]
    pub fn new(x: f32, z: f32, width: f32, depth: f32, y: f32) -> Self {
        Self {
            min_x: x - width / 2.0,
            max_x: x + width / 2.0,
            min_z: z - depth / 2.0,
            max_z: z + depth / 2.0,
            y,
        }
    }

    /// Inclusive XZ containment.
    #[inline]
    #[must_use]
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let b = Aabb::from_center(Vec3::ZERO, 2.0, 2.0, 2.0);
        assert!(b.contains(Vec3::new(1.0, 1.0, 1.0)));
        assert!(!b.contains(Vec3::new(1.01, 0.0, 0.0)));
    }

    #[test]
    fn test_circle_touching_corner() {
        let b = Aabb::from_center(Vec3::ZERO, 2.0, 2.0, 2.0);
        // Corner at (1, 1); circle centre sqrt(2) * 0.9 away from it.
        assert!(b.intersects_circle_xz(1.6, 1.6, 0.9));
        assert!(!b.intersects_circle_xz(1.8, 1.8, 0.9));
    }

    #[test]
    fn test_band_overlap_is_open() {
        let b = Aabb::from_center(Vec3::new(0.0, 1.0, 0.0), 1.0, 2.0, 1.0);
        assert!(!b.overlaps_band(2.0, 3.8));
        assert!(b.overlaps_band(1.9, 3.7));
    }
}
