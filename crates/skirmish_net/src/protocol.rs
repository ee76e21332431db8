//! # Wire Protocol
//!
//! JSON text messages, one per line, discriminated by a `"type"` field:
//!
//! ```text
//! client -> server   join | move | shoot | respawn
//! server -> client   hello | joinResponse | gameState | bulletFired
//! debug  -> server   debugKillPlayer
//! server -> debug    debugState
//! ```
//!
//! Every server message travels in an [`Envelope`] carrying a monotonic
//! sequence number and the server timestamp.

use crate::error::NetResult;
use crate::snapshot::StateSnapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skirmish_shared::{Rotation, Vec3};
use skirmish_sim::GameConfig;
use skirmish_world::WorldLayout;

/// Messages a game client sends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Ask for an actor.
    Join,
    /// Proposed position and view.
    #[serde(rename_all = "camelCase")]
    Move {
        /// Desired feet position.
        position: Vec3,
        /// View rotation.
        rotation: Rotation,
        /// Increasing per-client counter, echoed back in snapshots.
        #[serde(default)]
        input_sequence: Option<u64>,
    },
    /// Fire along the current view.
    Shoot,
    /// Come back after dying.
    Respawn,
}

/// Messages a debug client sends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DebugCommand {
    /// Kill an actor on behalf of the admin.
    #[serde(rename_all = "camelCase")]
    DebugKillPlayer {
        /// Victim id.
        player_id: String,
    },
}

/// Server settings a client needs to behave like the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Effective arena half-size.
    pub arena_half_size: f32,
    /// Minimum time between shots.
    pub shoot_cooldown_ms: u64,
    /// Health of a fresh actor.
    pub max_health: f32,
    /// Mouse look scale.
    pub look_sensitivity: f32,
    /// Snapshots per second.
    pub broadcast_rate: u32,
    /// Decimal places kept in snapshots.
    pub snapshot_precision: u32,
    /// Whether the dead come back on their own.
    pub auto_respawn: bool,
    /// Auto-respawn delay.
    pub auto_respawn_delay_ms: u64,
}

impl ClientConfig {
    /// Picks the client-facing values out of `config`.
    #[must_use]
    pub fn from_game(config: &GameConfig, arena_half_size: f32) -> Self {
        Self {
            arena_half_size,
            shoot_cooldown_ms: config.combat.shoot_cooldown_ms,
            max_health: config.player.max_health,
            look_sensitivity: config.input.look_sensitivity,
            broadcast_rate: config.network.broadcast_rate,
            snapshot_precision: config.network.snapshot_precision,
            auto_respawn: config.respawn.auto_respawn,
            auto_respawn_delay_ms: config.respawn.delay_ms().unwrap_or(0),
        }
    }
}

/// Just enough of a bullet for client-side effects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulletEffect {
    /// Muzzle position.
    pub position: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

/// Messages the server sends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent on connect; the client may now join.
    Hello,
    /// Answer to `join`.
    #[serde(rename_all = "camelCase")]
    JoinResponse {
        /// Id of the new actor.
        player_id: String,
        /// Assigned display name.
        name: String,
        /// The whole arena; `generatedAt` doubles as its version.
        world_layout: WorldLayout,
        /// Effective settings.
        config: ClientConfig,
    },
    /// Periodic authoritative state.
    GameState {
        /// Actors, recent bullets, recent kills.
        state: StateSnapshot,
    },
    /// A player fired; purely cosmetic.
    BulletFired {
        /// Where and which way.
        bullet: BulletEffect,
    },
    /// Uncapped state plus the world, for the debug channel.
    DebugState {
        /// Full snapshot.
        state: StateSnapshot,
    },
}

impl ServerMessage {
    /// Wire name of the message, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::JoinResponse { .. } => "joinResponse",
            Self::GameState { .. } => "gameState",
            Self::BulletFired { .. } => "bulletFired",
            Self::DebugState { .. } => "debugState",
        }
    }
}

/// A server message stamped with sequence number and time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Monotonic per server run.
    pub seq: u64,
    /// Server wall clock (ms).
    pub timestamp: u64,
    /// The message itself.
    #[serde(flatten)]
    pub body: ServerMessage,
}

/// Encodes a message as one line of JSON, without the trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> NetResult<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decodes one line of JSON.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(line: &str) -> NetResult<T> {
    Ok(serde_json::from_str(line.trim())?)
}
