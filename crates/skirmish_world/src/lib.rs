//! # SKIRMISH World
//!
//! Procedural arena generation and the collision queries built on top of it.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and config always produce the same arena
//! 2. **Validated**: A layout is checked for consistency before it is used
//! 3. **Immutable**: Generated once per server run, read-only afterwards
//! 4. **Collision-correct**: Geometry is only as detailed as gameplay needs
//!
//! ## Core Components
//!
//! - `WorldGenerator`: streets, buildings, openings, upper floors, ramps
//! - `WorldLayout`: the generated arena, sent to clients as-is
//! - `CollisionIndex`: actor/bullet blocking, terrain height, line of sight
//!
//! ## Example
//!
//! ```rust,ignore
//! use skirmish_world::{CollisionIndex, WorldConfig, WorldGenerator, WorldSeed};
//!
//! let generator = WorldGenerator::new(WorldSeed::new(42), 80.0, 1.0, WorldConfig::default());
//! let layout = generator.generate()?;
//! let index = CollisionIndex::build(&layout, 1.0, 1.0, 1.8);
//!
//! let spawn = index.find_spawn_point(&mut WorldSeed::new(42).rng(SIMULATION_STREAM));
//! assert!(index.is_free_for_actor(spawn));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collision;
pub mod config;
pub mod error;
pub mod generator;
pub mod layout;
pub mod seed;

pub use collision::{Aabb, CollisionIndex, FlatRect};
pub use config::WorldConfig;
pub use error::{WorldError, WorldResult};
pub use generator::WorldGenerator;
pub use layout::{
    Building, FloorSlab, Opening, OpeningKind, Ramp, RampHeading, Side, StreetGrid, Volume, Wall, WallKind,
    WorldLayout,
};
pub use seed::{WorldSeed, LAYOUT_STREAM, SIMULATION_STREAM};
