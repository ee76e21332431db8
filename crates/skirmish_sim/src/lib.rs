//! # SKIRMISH Sim
//!
//! The authoritative simulation: actors, bullets, bots and kills.
//!
//! ## Design Principles
//!
//! 1. **Authoritative**: Clients suggest, the simulation decides
//! 2. **Fixed-step**: [`Simulation::step`] runs at the tick rate, time is passed in
//! 3. **Deterministic**: One seeded random stream, ordered collections
//! 4. **Forgiving**: Invalid actions are ignored, never errors
//!
//! ## Core Components
//!
//! - `ActorStore`: join/leave, movement, kill and respawn
//! - `ProjectileSystem`: bullet flight and broadphase hit tests
//! - `bot`: perception plus one decision function per archetype
//! - `KillBook` / `KillLog`: kill history and its JSON-lines file
//! - `Simulation`: the aggregate the server drives
//!
//! ## Example
//!
//! ```rust,ignore
//! use skirmish_sim::{GameConfig, Simulation};
//!
//! let mut sim = Simulation::new(GameConfig::load(None)?)?;
//! let me = sim.join();
//! let report = sim.step(now_ms);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod actor;
pub mod bot;
pub mod config;
pub mod error;
pub mod kills;
pub mod names;
pub mod projectile;
pub mod simulation;

pub use actor::{Actor, ActorId, ActorKind, ActorStore, KILL_SCORE, PLAYER_COLORS};
pub use bot::{BotArchetype, BotSettings, BotState, BotTuning};
pub use config::GameConfig;
pub use error::{SimError, SimResult};
pub use kills::{KillBook, KillLog, KillRecord};
pub use projectile::{Bullet, ProjectileReport, ProjectileSystem};
pub use simulation::{Simulation, StepReport, ADMIN_KILLER_ID, ADMIN_KILLER_NAME};
