//! # World Layout
//!
//! The immutable output of the generator. Sent to clients verbatim inside
//! `joinResponse`, and flattened into a [`CollisionIndex`](crate::CollisionIndex)
//! once per server run.
//!
//! ## Coordinates
//!
//! ```text
//!            -Z (north)
//!               │
//!   -X (west) ──┼── +X (east)
//!               │
//!            +Z (south)
//! ```
//!
//! All boxes are stored as centre + full extents. Walls stand on y = 0.

use crate::error::{WorldError, WorldResult};
use serde::{Deserialize, Serialize};

/// Axis-aligned box given by its centre and full extents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// Centre X.
    pub x: f32,
    /// Centre Y.
    pub y: f32,
    /// Centre Z.
    pub z: f32,
    /// Extent along X.
    pub width: f32,
    /// Extent along Y.
    pub height: f32,
    /// Extent along Z.
    pub depth: f32,
}

impl Volume {
    /// Box standing on the ground (y from 0 to `height`).
    #[must_use]
    pub fn grounded(x: f32, z: f32, width: f32, depth: f32, height: f32) -> Self {
        Self { x, y: height / 2.0, z, width, height, depth }
    }

    /// Lowest Y of the box.
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y - self.height / 2.0
    }

    /// Highest Y of the box.
    #[inline]
    #[must_use]
    pub fn top(&self) -> f32 {
        self.y + self.height / 2.0
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y, self.z, self.width, self.height, self.depth]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// What a free-standing wall is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WallKind {
    /// Encloses the whole arena.
    Boundary,
    /// Inner ring with corner and midpoint gates.
    OuterStraight,
    /// Short obstacle in the middle of a street.
    StreetWall,
    /// One arm of a cross at a street intersection.
    CrossPattern,
}

/// Free-standing wall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// Wall role.
    #[serde(rename = "type")]
    pub kind: WallKind,
    /// Wall geometry.
    #[serde(flatten)]
    pub volume: Volume,
}

/// One of the four sides of a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Faces -Z.
    North,
    /// Faces +Z.
    South,
    /// Faces +X.
    East,
    /// Faces -X.
    West,
}

impl Side {
    /// All four sides in generation order.
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::West, Self::East];

    /// `true` for sides that run along the X axis.
    #[must_use]
    pub const fn runs_along_x(self) -> bool {
        matches!(self, Self::North | Self::South)
    }
}

/// Door or window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningKind {
    /// Reaches the ground; actors walk through.
    Door,
    /// Floats above a sill; bullets pass, actors do not.
    Window,
}

/// A hole cut into one side of a building.
///
/// `start`/`end` run along the side, measured from its centre.
/// `bottom`/`top` are heights above the ground.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    /// Side the opening is cut into.
    pub side: Side,
    /// Door or window.
    #[serde(rename = "type")]
    pub kind: OpeningKind,
    /// Start along the side.
    pub start: f32,
    /// End along the side.
    pub end: f32,
    /// Bottom edge height.
    pub bottom: f32,
    /// Top edge height.
    pub top: f32,
}

impl Opening {
    /// Width along the side.
    #[inline]
    #[must_use]
    pub fn span(&self) -> f32 {
        self.end - self.start
    }
}

/// A rectangular building with cut-out openings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    /// Stable id (`b-<group>-<part>`).
    pub id: String,
    /// Footprint centre X.
    pub x: f32,
    /// Footprint centre Z.
    pub z: f32,
    /// Footprint width (X).
    pub width: f32,
    /// Footprint depth (Z).
    pub depth: f32,
    /// Width of the lot the building was placed on.
    pub lot_width: f32,
    /// Depth of the lot the building was placed on.
    pub lot_depth: f32,
    /// Wall thickness.
    pub wall_thickness: f32,
    /// Wall height.
    pub wall_height: f32,
    /// One entry per door; a side may repeat.
    pub door_sides: Vec<Side>,
    /// Doors and windows, sorted by side then position.
    pub openings: Vec<Opening>,
    /// Solid wall pieces left after cutting the openings.
    pub wall_segments: Vec<Volume>,
    /// Height of the walkable second floor, if any.
    pub second_floor_y: Option<f32>,
}

impl Building {
    /// Length of a side.
    #[must_use]
    pub fn side_length(&self, side: Side) -> f32 {
        if side.runs_along_x() {
            self.width
        } else {
            self.depth
        }
    }
}

/// Walkable slab of an upper floor. `y` is the walking surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorSlab {
    /// Owning building.
    pub building_id: String,
    /// Centre X.
    pub x: f32,
    /// Centre Z.
    pub z: f32,
    /// Extent along X.
    pub width: f32,
    /// Extent along Z.
    pub depth: f32,
    /// Walking surface height.
    pub y: f32,
    /// Slab thickness below the surface.
    pub thickness: f32,
}

/// Heading a ramp rises towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum RampHeading {
    /// Rises towards +X (0°).
    East,
    /// Rises towards +Z (90°).
    South,
    /// Rises towards -X (180°).
    West,
    /// Rises towards -Z (270°).
    North,
}

impl RampHeading {
    /// Degrees, one of 0/90/180/270.
    #[must_use]
    pub const fn degrees(self) -> i32 {
        match self {
            Self::East => 0,
            Self::South => 90,
            Self::West => 180,
            Self::North => 270,
        }
    }

    /// Converts a world offset from the ramp centre into the ramp frame.
    ///
    /// Local X runs up the ramp, local Z across it.
    #[must_use]
    pub fn to_local(self, dx: f32, dz: f32) -> (f32, f32) {
        match self {
            Self::East => (dx, dz),
            Self::South => (dz, -dx),
            Self::West => (-dx, -dz),
            Self::North => (-dz, dx),
        }
    }
}

impl From<i32> for RampHeading {
    /// Snaps any angle to the nearest quarter turn.
    fn from(degrees: i32) -> Self {
        let quarter = (f64::from(degrees) / 90.0).round() as i64;
        match quarter.rem_euclid(4) {
            0 => Self::East,
            1 => Self::South,
            2 => Self::West,
            _ => Self::North,
        }
    }
}

impl From<RampHeading> for i32 {
    fn from(heading: RampHeading) -> Self {
        heading.degrees()
    }
}

/// Straight ramp between two heights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ramp {
    /// Owning building.
    pub building_id: String,
    /// Centre X.
    pub x: f32,
    /// Centre Z.
    pub z: f32,
    /// Extent across the slope.
    pub width: f32,
    /// Extent along the slope.
    pub length: f32,
    /// Direction of rise.
    pub direction: RampHeading,
    /// Height at the low end.
    pub start_y: f32,
    /// Height at the high end.
    pub end_y: f32,
}

/// Street grid the city was laid out on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetGrid {
    /// Street width.
    pub street_width: f32,
    /// Block columns.
    pub blocks_x: u32,
    /// Block rows.
    pub blocks_z: u32,
    /// X of every north-south street centre line.
    pub vertical_centers: Vec<f32>,
    /// Z of every east-west street centre line.
    pub horizontal_centers: Vec<f32>,
}

/// Complete generated arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldLayout {
    /// Generation timestamp in ms; doubles as the layout version.
    pub generated_at: u64,
    /// Seed the layout was generated from.
    pub seed: u64,
    /// Effective half-size; the playable square is `[-half_size, half_size]`.
    pub half_size: f32,
    /// Street grid.
    pub streets: StreetGrid,
    /// Free-standing walls.
    pub walls: Vec<Wall>,
    /// Buildings.
    pub buildings: Vec<Building>,
    /// Upper floor slabs.
    pub second_floors: Vec<FloorSlab>,
    /// Partial walls standing on upper floors.
    pub upper_walls: Vec<Volume>,
    /// Ramps up to upper floors.
    pub ramps: Vec<Ramp>,
}

impl WorldLayout {
    /// Checks the layout is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> WorldResult<()> {
        if !self.half_size.is_finite() {
            return Err(WorldError::NonFinite("half_size"));
        }
        if self.walls.iter().any(|w| !w.volume.is_finite()) {
            return Err(WorldError::NonFinite("walls"));
        }
        if self.upper_walls.iter().any(|w| !w.is_finite()) {
            return Err(WorldError::NonFinite("upper walls"));
        }

        for building in &self.buildings {
            if building.width > building.lot_width + 1e-3 || building.depth > building.lot_depth + 1e-3 {
                return Err(WorldError::FootprintExceedsLot {
                    building: building.id.clone(),
                    width: building.width,
                    depth: building.depth,
                    lot_width: building.lot_width,
                    lot_depth: building.lot_depth,
                });
            }
            if building.wall_segments.iter().any(|s| !s.is_finite()) {
                return Err(WorldError::NonFinite("wall segments"));
            }

            for side in Side::ALL {
                let half = building.side_length(side) / 2.0;
                let on_side: Vec<&Opening> =
                    building.openings.iter().filter(|o| o.side == side).collect();
                for (i, opening) in on_side.iter().enumerate() {
                    if opening.start < -half || opening.end > half || opening.span() <= 0.0 {
                        return Err(WorldError::OpeningOutOfBounds {
                            building: building.id.clone(),
                            start: opening.start,
                            end: opening.end,
                            side_length: half * 2.0,
                        });
                    }
                    if opening.kind == OpeningKind::Door && opening.bottom > 1e-3 {
                        return Err(WorldError::FloatingDoor(building.id.clone()));
                    }
                    let overlaps = on_side[i + 1..].iter().any(|other| {
                        opening.start < other.end
                            && other.start < opening.end
                            && opening.bottom < other.top
                            && other.bottom < opening.top
                    });
                    if overlaps {
                        return Err(WorldError::OverlappingOpenings(building.id.clone()));
                    }
                }
            }

            if building.second_floor_y.is_some()
                && !self.ramps.iter().any(|r| r.building_id == building.id)
            {
                return Err(WorldError::UnreachableFloor(building.id.clone()));
            }
        }

        Ok(())
    }
}
