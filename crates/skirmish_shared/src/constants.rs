//! # Protocol Constants
//!
//! Defaults shared by server and client. Every value here can be overridden
//! through the server configuration; these are what an unconfigured server
//! runs with.

// =============================================================================
// NETWORK CONFIGURATION
// =============================================================================

/// Server bind address (accepts connections from all interfaces).
pub const DEFAULT_BIND: &str = "0.0.0.0:7777";

/// Simulation tick rate (ticks per second).
pub const TICK_RATE: u32 = 60;

/// Snapshot broadcast rate (snapshots per second).
pub const BROADCAST_RATE: u32 = 30;

/// Duration of one simulation tick in microseconds.
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / TICK_RATE as u64;

// =============================================================================
// ACTOR SHAPE
// =============================================================================

/// Radius of the actor capsule in the XZ plane.
pub const ACTOR_RADIUS: f32 = 1.0;

/// Height of the actor capsule above its feet.
pub const ACTOR_HEIGHT: f32 = 1.8;

/// Ground level actors stand on when not on a ramp or upper floor.
pub const GROUND_Y: f32 = 1.0;
