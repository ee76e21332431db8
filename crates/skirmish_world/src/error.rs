//! # World Error Types
//!
//! A generated layout is checked before anyone gets to see it. These are the
//! ways it can be inconsistent.

use thiserror::Error;

/// Errors raised when a layout fails its consistency check.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    /// An opening extends past the wall it was cut into.
    #[error("building {building}: opening [{start}, {end}] exceeds side length {side_length}")]
    OpeningOutOfBounds {
        /// Building id.
        building: String,
        /// Opening start along the side.
        start: f32,
        /// Opening end along the side.
        end: f32,
        /// Length of the side.
        side_length: f32,
    },

    /// Two openings on the same side overlap.
    #[error("building {0}: overlapping openings")]
    OverlappingOpenings(String),

    /// A door does not reach the ground.
    #[error("building {0}: door does not reach the ground")]
    FloatingDoor(String),

    /// A building footprint is larger than the lot it was placed on.
    #[error("building {building}: footprint {width}x{depth} exceeds lot {lot_width}x{lot_depth}")]
    FootprintExceedsLot {
        /// Building id.
        building: String,
        /// Footprint width.
        width: f32,
        /// Footprint depth.
        depth: f32,
        /// Lot width.
        lot_width: f32,
        /// Lot depth.
        lot_depth: f32,
    },

    /// A second floor has no ramp leading up to it.
    #[error("building {0}: second floor without a ramp")]
    UnreachableFloor(String),

    /// Something in the layout is NaN or infinite.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
