//! # SKIRMISH Net
//!
//! Netcode for the arena: what goes over the wire, how it maps onto the
//! simulation, and how clients keep their own actor responsive.
//!
//! ## Design Principles
//!
//! 1. **Authoritative**: The server owns every position, hit and kill
//! 2. **Last state wins**: Lost snapshots are superseded, never resent
//! 3. **Quiet on misuse**: Invalid actions are ignored without a reply
//! 4. **Non-blocking**: Slow clients queue, the tick never waits
//!
//! ## Core Components
//!
//! - `protocol`: message types and the JSON line codec
//! - `snapshot`: rounded, capped `gameState` payloads
//! - `session`: `NetSync`, the message handler over the simulation
//! - `prediction`: client-side prediction and reconciliation
//! - `server`: TCP transport plus the simulation and broadcast loops
//!
//! ## Example
//!
//! ```rust,ignore
//! use skirmish_net::{ArenaServer, NetResult};
//! use skirmish_sim::{GameConfig, Simulation};
//!
//! let simulation = Simulation::new(GameConfig::load(None)?)?;
//! ArenaServer::bind(simulation).await?.run().await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod prediction;
pub mod protocol;
pub mod server;
pub mod session;
pub mod snapshot;

pub use error::{NetError, NetResult};
pub use prediction::{ClientPredictor, FrameInput, PendingInput, Reconciliation, SeenKills};
pub use protocol::{BulletEffect, ClientConfig, ClientMessage, DebugCommand, Envelope, ServerMessage};
pub use server::{ArenaServer, ServerConfig, ShutdownHandle, TickLoop, TickStats};
pub use session::{Ignored, NetSync, Outcome, Session};
pub use snapshot::{ActorView, BulletView, SnapshotLimits, StateSnapshot};
