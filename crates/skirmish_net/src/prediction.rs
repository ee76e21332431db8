//! # Client-Side Prediction
//!
//! The client moves its own actor immediately and lets the server catch up.
//!
//! ## How It Works
//!
//! 1. Every frame the client integrates its input locally and, if anything
//!    changed, sends a `move` with a fresh sequence number.
//! 2. Each sent move is buffered as `{sequence, position, rotation}`.
//! 3. A snapshot reports the last sequence the server applied. The client
//!    finds that buffered entry, takes `server - buffered` as the error the
//!    server saw, and shifts its *current* prediction by that much.
//! 4. The shifted target is reached instantly if far away, otherwise by
//!    blending a fixed fraction per snapshot.
//!
//! ```text
//! Sent:       [4] [5] [6] [7]
//! Snapshot:   ack=5, server pos S
//! Correction: target = current + (S - buffered[5]); keep [6] [7]
//! ```

use crate::protocol::ClientMessage;
use crate::snapshot::ActorView;
use skirmish_shared::{clamp, Rotation, Vec3};
use skirmish_sim::KillRecord;
use skirmish_world::CollisionIndex;
use std::collections::{HashSet, VecDeque};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

/// Buffered moves kept while waiting for acknowledgement.
pub const MAX_PENDING_INPUTS: usize = 120;
/// Errors above this distance snap instead of blending.
pub const SNAP_DISTANCE: f32 = 8.0;
/// Errors at or below this distance are left alone.
pub const DEAD_ZONE: f32 = 0.02;
/// Fraction of the error removed per snapshot.
pub const CORRECTION_BLEND: f32 = 0.35;
/// Walking speed in units per second.
pub const MOVE_SPEED: f32 = 50.0;

/// A move the server has not acknowledged yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingInput {
    /// Sequence sent with the move.
    pub sequence: u64,
    /// Predicted position after the move.
    pub position: Vec3,
    /// Rotation after the move.
    pub rotation: Rotation,
    /// Client clock when sent.
    pub timestamp: u64,
}

/// One frame of player input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Strafe axis, right positive.
    pub strafe: f32,
    /// Walk axis, forward positive.
    pub forward: f32,
    /// Mouse delta, horizontal.
    pub look_x: f32,
    /// Mouse delta, vertical.
    pub look_y: f32,
    /// Fire button held.
    pub shooting: bool,
}

impl FrameInput {
    fn is_moving(&self) -> bool {
        self.strafe != 0.0 || self.forward != 0.0
    }
}

/// What reconciliation did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reconciliation {
    /// Error within the dead zone; position untouched.
    Settled,
    /// Moved part of the way towards the target.
    Blended {
        /// Distance to the target before blending.
        error: f32,
    },
    /// Jumped to the target.
    Snapped {
        /// Distance to the target before snapping.
        error: f32,
    },
}

/// Local prediction state for the client's own actor.
#[derive(Clone, Debug)]
pub struct ClientPredictor {
    world: Arc<CollisionIndex>,
    position: Vec3,
    rotation: Rotation,
    pending: VecDeque<PendingInput>,
    next_sequence: u64,
    look_sensitivity: f32,
    dead: bool,
}

impl ClientPredictor {
    /// Starts predicting from `position`, moving through `world`.
    #[must_use]
    pub fn new(world: Arc<CollisionIndex>, position: Vec3, look_sensitivity: f32) -> Self {
        Self {
            world,
            position,
            rotation: Rotation::default(),
            pending: VecDeque::with_capacity(MAX_PENDING_INPUTS),
            // A fresh server actor reports 0 before any move lands.
            next_sequence: 1,
            look_sensitivity,
            dead: false,
        }
    }

    /// Predicted position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Predicted rotation.
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Moves not yet acknowledged, oldest first.
    #[must_use]
    pub fn pending(&self) -> &VecDeque<PendingInput> {
        &self.pending
    }

    /// Integrates one frame and returns the `move` to send, if any.
    ///
    /// Nothing moves while dead.
    pub fn predict(&mut self, input: &FrameInput, dt_secs: f32, now_ms: u64) -> Option<ClientMessage> {
        if self.dead {
            return None;
        }

        let step = MOVE_SPEED * dt_secs.max(0.0);
        let (strafe, forward) = normalized(input.strafe, input.forward);
        let ahead = self.rotation.forward();
        let (sin_yaw, cos_yaw) = self.rotation.yaw.sin_cos();
        let desired = Vec3::new(
            self.position.x + (ahead.x * forward + cos_yaw * strafe) * step,
            self.position.y,
            self.position.z + (ahead.z * forward - sin_yaw * strafe) * step,
        );
        self.position = self.world.resolve_movement(self.position, desired);

        let rotated = input.look_x != 0.0 || input.look_y != 0.0;
        self.rotation.pitch = clamp(
            self.rotation.pitch - input.look_y * self.look_sensitivity,
            -FRAC_PI_2,
            FRAC_PI_2,
        );
        self.rotation.yaw -= input.look_x * self.look_sensitivity;

        if !(input.is_moving() || input.shooting || rotated) {
            return None;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.push_back(PendingInput {
            sequence,
            position: self.position,
            rotation: self.rotation,
            timestamp: now_ms,
        });
        while self.pending.len() > MAX_PENDING_INPUTS {
            self.pending.pop_front();
        }

        Some(ClientMessage::Move {
            position: self.position,
            rotation: self.rotation,
            input_sequence: Some(sequence),
        })
    }

    /// Folds the server's view of this actor into the prediction.
    pub fn reconcile(&mut self, server: &ActorView) -> Reconciliation {
        self.dead = !server.is_alive;
        let acknowledged = server.last_input_sequence;

        let matched = self.pending.iter().find(|input| input.sequence == acknowledged).copied();
        self.pending.retain(|input| input.sequence > acknowledged);

        let (target, target_rotation) = match matched {
            Some(input) => (
                self.position + (server.position - input.position),
                Rotation::new(
                    self.rotation.pitch + (server.rotation.pitch - input.rotation.pitch),
                    self.rotation.yaw + (server.rotation.yaw - input.rotation.yaw),
                ),
            ),
            None => (server.position, server.rotation),
        };

        let delta = target - self.position;
        let error = delta.length();
        let result = if error > SNAP_DISTANCE {
            self.position = target;
            Reconciliation::Snapped { error }
        } else if error > DEAD_ZONE {
            self.position += delta * CORRECTION_BLEND;
            Reconciliation::Blended { error }
        } else {
            Reconciliation::Settled
        };

        self.rotation.pitch += (target_rotation.pitch - self.rotation.pitch) * CORRECTION_BLEND;
        self.rotation.yaw += (target_rotation.yaw - self.rotation.yaw) * CORRECTION_BLEND;
        result
    }
}

/// Scales an input axis pair to unit length so diagonals are not faster.
fn normalized(x: f32, z: f32) -> (f32, f32) {
    let length = x.hypot(z);
    if length > 0.0 {
        (x / length, z / length)
    } else {
        (0.0, 0.0)
    }
}

/// Kills already shown to the player.
#[derive(Clone, Debug, Default)]
pub struct SeenKills {
    seen: HashSet<(String, String, u64)>,
}

impl SeenKills {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The kills in `kills` not seen before, marking them seen.
    pub fn fresh<'a>(&mut self, kills: &'a [KillRecord]) -> Vec<&'a KillRecord> {
        kills
            .iter()
            .filter(|kill| {
                self.seen
                    .insert((kill.killer_id.clone(), kill.victim_id.clone(), kill.timestamp))
            })
            .collect()
    }

    /// Number of kills seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// `true` if nothing was seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
