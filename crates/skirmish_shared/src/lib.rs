//! # Skirmish Shared
//!
//! Common types used by the world generator, the simulation and the wire
//! protocol.
//!
//! ## Rule
//!
//! Nothing in here knows about actors, bullets or sockets. If a type needs
//! gameplay context it belongs in `skirmish_sim` or `skirmish_net`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod constants;
pub mod math;
pub mod time;

pub use constants::{BROADCAST_RATE, DEFAULT_BIND, TICK_RATE};
pub use math::{clamp, Rotation, Vec3};
pub use time::unix_millis;
