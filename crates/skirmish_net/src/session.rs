//! # NetSync
//!
//! Turns client messages into simulation calls and simulation state into
//! server messages. Transport-agnostic: the TCP server and the tests drive
//! it the same way.
//!
//! ## Rules
//!
//! - Actions from sessions that have not joined are ignored.
//! - Actions by dead actors are ignored, except `respawn`.
//! - Ignored actions produce no reply; the next snapshot tells the client
//!   what actually happened.

use crate::protocol::{BulletEffect, ClientConfig, ClientMessage, DebugCommand, Envelope, ServerMessage};
use crate::snapshot::{SnapshotLimits, StateSnapshot};
use skirmish_sim::{Actor, ActorId, Simulation, StepReport};
use tracing::{debug, info};

/// One connection's view of the game.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    player: Option<ActorId>,
}

impl Session {
    /// A session that has not joined yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Actor controlled by this session.
    #[must_use]
    pub fn player(&self) -> Option<&ActorId> {
        self.player.as_ref()
    }
}

/// Why an action had no effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ignored {
    /// The session has not sent `join`.
    NotJoined,
    /// The session already has an actor.
    AlreadyJoined,
    /// The actor is gone.
    UnknownPlayer,
    /// The actor is dead.
    Dead,
    /// `respawn` while alive.
    Alive,
    /// `shoot` before the cooldown elapsed.
    Cooldown,
}

/// What the transport should do after a message was handled.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Send this to the sender only.
    Reply(Envelope),
    /// Send this to every game client.
    Broadcast(Envelope),
    /// State changed; nothing to send right now.
    Applied,
    /// Nothing happened.
    Ignored(Ignored),
}

/// The simulation plus everything needed to talk about it.
pub struct NetSync {
    simulation: Simulation,
    sequence: u64,
    broadcast_limits: SnapshotLimits,
    debug_limits: SnapshotLimits,
    client_config: ClientConfig,
}

impl NetSync {
    /// Wraps `simulation`.
    #[must_use]
    pub fn new(simulation: Simulation) -> Self {
        let config = simulation.config();
        let client_config = ClientConfig::from_game(config, simulation.layout().half_size);
        Self {
            broadcast_limits: SnapshotLimits::broadcast(config),
            debug_limits: SnapshotLimits::debug(config),
            client_config,
            sequence: 0,
            simulation,
        }
    }

    /// The wrapped simulation.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Last sequence number handed out.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Settings echoed to joining clients.
    #[must_use]
    pub fn client_config(&self) -> &ClientConfig {
        &self.client_config
    }

    fn stamp(&mut self, body: ServerMessage, now_ms: u64) -> Envelope {
        self.sequence += 1;
        Envelope {
            seq: self.sequence,
            timestamp: now_ms,
            body,
        }
    }

    /// Greeting for a fresh connection.
    pub fn hello(&mut self, now_ms: u64) -> Envelope {
        self.stamp(ServerMessage::Hello, now_ms)
    }

    /// Handles one message from a game client.
    pub fn handle(&mut self, session: &mut Session, message: ClientMessage, now_ms: u64) -> Outcome {
        let outcome = match message {
            ClientMessage::Join => self.join(session, now_ms),
            ClientMessage::Move {
                position,
                rotation,
                input_sequence,
            } => self.with_live_player(session, |sync, id| {
                if sync.simulation.move_actor(id.as_str(), position, rotation, input_sequence) {
                    Outcome::Applied
                } else {
                    Outcome::Ignored(Ignored::UnknownPlayer)
                }
            }),
            ClientMessage::Shoot => self.with_live_player(session, |sync, id| {
                match sync.simulation.shoot(id.as_str(), now_ms) {
                    Some(bullet) => {
                        let effect = BulletEffect {
                            position: bullet.position,
                            direction: bullet.direction,
                        };
                        Outcome::Broadcast(sync.stamp(ServerMessage::BulletFired { bullet: effect }, now_ms))
                    }
                    None => Outcome::Ignored(Ignored::Cooldown),
                }
            }),
            ClientMessage::Respawn => self.respawn(session, now_ms),
        };
        if let Outcome::Ignored(reason) = &outcome {
            debug!(player = ?session.player(), ?reason, "action ignored");
        }
        outcome
    }

    fn join(&mut self, session: &mut Session, now_ms: u64) -> Outcome {
        if session.player.is_some() {
            return Outcome::Ignored(Ignored::AlreadyJoined);
        }
        let id = self.simulation.join();
        let Some(actor) = self.simulation.actor(id.as_str()) else {
            return Outcome::Ignored(Ignored::UnknownPlayer);
        };
        let name = actor.name.clone();
        info!(player = %id, %name, players = self.simulation.player_count(), "player joined");

        let body = ServerMessage::JoinResponse {
            player_id: id.to_string(),
            name,
            world_layout: self.simulation.layout().as_ref().clone(),
            config: self.client_config.clone(),
        };
        session.player = Some(id);
        Outcome::Reply(self.stamp(body, now_ms))
    }

    fn respawn(&mut self, session: &Session, now_ms: u64) -> Outcome {
        let Some(id) = session.player.clone() else {
            return Outcome::Ignored(Ignored::NotJoined);
        };
        match self.simulation.actor(id.as_str()) {
            None => Outcome::Ignored(Ignored::UnknownPlayer),
            Some(actor) if actor.is_alive() => Outcome::Ignored(Ignored::Alive),
            Some(_) => {
                self.simulation.respawn(id.as_str());
                info!(player = %id, "player respawned");
                Outcome::Broadcast(self.game_state(now_ms))
            }
        }
    }

    fn with_live_player(&mut self, session: &Session, action: impl FnOnce(&mut Self, &ActorId) -> Outcome) -> Outcome {
        let Some(id) = session.player.as_ref() else {
            return Outcome::Ignored(Ignored::NotJoined);
        };
        match self.simulation.actor(id.as_str()) {
            None => Outcome::Ignored(Ignored::UnknownPlayer),
            Some(actor) if !actor.is_alive() => Outcome::Ignored(Ignored::Dead),
            Some(_) => action(self, id),
        }
    }

    /// Handles one message from the debug channel.
    pub fn handle_debug(&mut self, command: DebugCommand, now_ms: u64) -> Outcome {
        match command {
            DebugCommand::DebugKillPlayer { player_id } => match self.simulation.actor(&player_id) {
                None => Outcome::Ignored(Ignored::UnknownPlayer),
                Some(actor) if !actor.is_alive() => Outcome::Ignored(Ignored::Dead),
                Some(_) => {
                    self.simulation.admin_kill(&player_id, now_ms);
                    info!(player = %player_id, "admin kill");
                    Outcome::Broadcast(self.game_state(now_ms))
                }
            },
        }
    }

    /// Removes the session's actor. Its bullets keep flying.
    pub fn disconnect(&mut self, session: &mut Session) -> Option<Actor> {
        let id = session.player.take()?;
        let removed = self.simulation.remove(id.as_str());
        info!(player = %id, players = self.simulation.player_count(), "player left");
        removed
    }

    /// Runs one simulation step.
    pub fn step(&mut self, now_ms: u64) -> StepReport {
        self.simulation.step(now_ms)
    }

    /// Capped `gameState` for every client.
    pub fn game_state(&mut self, now_ms: u64) -> Envelope {
        let state = StateSnapshot::capture(&self.simulation, self.broadcast_limits, now_ms);
        self.stamp(ServerMessage::GameState { state }, now_ms)
    }

    /// Uncapped `debugState` with the world attached.
    pub fn debug_state(&mut self, now_ms: u64) -> Envelope {
        let state = StateSnapshot::capture(&self.simulation, self.debug_limits, now_ms);
        self.stamp(ServerMessage::DebugState { state }, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_sim::config::PerArchetype;
    use skirmish_sim::GameConfig;
    use skirmish_world::{WorldConfig, WorldGenerator, WorldSeed};

    fn sync() -> NetSync {
        let mut config = GameConfig::default();
        config.bots.counts = PerArchetype::default();
        let seed = WorldSeed::new(11);
        let layout = WorldGenerator::new(seed, 40.0, 1.0, WorldConfig::default())
            .generate_at(0)
            .unwrap();
        NetSync::new(Simulation::with_layout(config, seed, layout, None))
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut sync = sync();
        let a = sync.hello(5);
        let b = sync.game_state(5);
        let c = sync.hello(4);
        assert!(a.seq < b.seq && b.seq < c.seq);
        assert_eq!(sync.sequence(), c.seq);
    }

    #[test]
    fn test_join_twice_is_ignored() {
        let mut sync = sync();
        let mut session = Session::new();
        assert!(matches!(sync.handle(&mut session, ClientMessage::Join, 0), Outcome::Reply(_)));
        assert_eq!(
            sync.handle(&mut session, ClientMessage::Join, 0),
            Outcome::Ignored(Ignored::AlreadyJoined)
        );
        assert_eq!(sync.simulation().player_count(), 1);
    }

    #[test]
    fn test_disconnect_without_join() {
        let mut sync = sync();
        let mut session = Session::new();
        assert!(sync.disconnect(&mut session).is_none());
    }
}
