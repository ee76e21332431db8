//! Client prediction and reconciliation against hand-made and real
//! server snapshots.

use skirmish_net::prediction::{CORRECTION_BLEND, MAX_PENDING_INPUTS};
use skirmish_net::{
    ActorView, ClientMessage, ClientPredictor, Envelope, FrameInput, NetSync, Reconciliation, ServerMessage, Session,
};
use skirmish_shared::{Rotation, Vec3};
use skirmish_sim::config::PerArchetype;
use skirmish_sim::{GameConfig, Simulation};
use skirmish_world::{CollisionIndex, StreetGrid, WorldLayout, WorldSeed};
use std::sync::Arc;

fn open_layout() -> WorldLayout {
    WorldLayout {
        generated_at: 0,
        seed: 0,
        half_size: 100.0,
        streets: StreetGrid::default(),
        walls: Vec::new(),
        buildings: Vec::new(),
        second_floors: Vec::new(),
        upper_walls: Vec::new(),
        ramps: Vec::new(),
    }
}

fn open_world() -> Arc<CollisionIndex> {
    Arc::new(CollisionIndex::build(&open_layout(), 1.0, 1.0, 1.8))
}

fn predictor() -> ClientPredictor {
    ClientPredictor::new(open_world(), Vec3::new(0.0, 1.0, 0.0), 0.006)
}

fn view(position: Vec3, rotation: Rotation, last_input_sequence: u64) -> ActorView {
    ActorView {
        id: "player-1".into(),
        name: "Me".into(),
        position,
        rotation,
        color: 0,
        health: 100.0,
        score: 0,
        is_alive: true,
        is_bot: false,
        bot_type: None,
        death_time: None,
        last_killer_name: None,
        last_input_sequence,
    }
}

const WALK: FrameInput = FrameInput {
    strafe: 0.0,
    forward: 1.0,
    look_x: 0.0,
    look_y: 0.0,
    shooting: false,
};

fn close(a: Vec3, b: Vec3) -> bool {
    a.distance(b) < 1e-4
}

/// Test: Walking forward at yaw 0 moves along -Z and buffers the move.
#[test]
fn test_predict_moves_and_buffers() {
    let mut p = predictor();
    let sent = p.predict(&WALK, 0.1, 1_000).unwrap();
    assert!(close(p.position(), Vec3::new(0.0, 1.0, -5.0)));
    assert_eq!(
        sent,
        ClientMessage::Move {
            position: p.position(),
            rotation: p.rotation(),
            input_sequence: Some(1),
        }
    );
    assert_eq!(p.pending().len(), 1);
    assert_eq!(p.pending()[0].timestamp, 1_000);

    assert!(p.predict(&FrameInput::default(), 0.1, 1_100).is_none());
    assert_eq!(p.pending().len(), 1);
}

/// Test: Strafing uses the view's right vector; looking turns and clamps pitch.
#[test]
fn test_strafe_and_look() {
    let mut p = predictor();
    let right = FrameInput {
        strafe: 1.0,
        ..FrameInput::default()
    };
    p.predict(&right, 0.1, 0);
    assert!(close(p.position(), Vec3::new(5.0, 1.0, 0.0)));

    let look = FrameInput {
        look_x: 100.0,
        look_y: -1_000.0,
        ..FrameInput::default()
    };
    assert!(p.predict(&look, 0.016, 0).is_some());
    assert!((p.rotation().yaw + 0.6).abs() < 1e-5);
    assert!((p.rotation().pitch - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
}

/// Test: The buffer keeps only the newest moves.
#[test]
fn test_pending_buffer_is_capped() {
    let mut p = predictor();
    for frame in 0..200 {
        p.predict(&WALK, 0.001, frame);
    }
    assert_eq!(p.pending().len(), MAX_PENDING_INPUTS);
    assert_eq!(p.pending().front().map(|i| i.sequence), Some(81));
    assert_eq!(p.pending().back().map(|i| i.sequence), Some(200));
}

/// Test: A server that agrees leaves the prediction alone and drops acked moves.
#[test]
fn test_agreeing_server_settles() {
    let mut p = predictor();
    p.predict(&WALK, 0.1, 0);
    let acked = p.pending()[0];
    p.predict(&WALK, 0.1, 16);

    let result = p.reconcile(&view(acked.position, acked.rotation, acked.sequence));
    assert_eq!(result, Reconciliation::Settled);
    assert!(close(p.position(), Vec3::new(0.0, 1.0, -10.0)));
    assert_eq!(p.pending().len(), 1);
    assert_eq!(p.pending()[0].sequence, 2);
}

/// Test: The server's error at the acked input shifts the current prediction.
#[test]
fn test_small_error_blends_from_current_position() {
    let mut p = predictor();
    p.predict(&WALK, 0.1, 0);
    let acked = p.pending()[0];
    p.predict(&WALK, 0.1, 16);
    let current = p.position();

    let server = acked.position + Vec3::new(1.0, 0.0, 0.0);
    let result = p.reconcile(&view(server, acked.rotation, acked.sequence));
    let Reconciliation::Blended { error } = result else {
        panic!("expected a blend, got {result:?}");
    };
    assert!((error - 1.0).abs() < 1e-4);
    assert!(close(p.position(), current + Vec3::new(CORRECTION_BLEND, 0.0, 0.0)));
}

/// Test: A snapshot taken before the first move lands keeps that move buffered.
#[test]
fn test_snapshot_before_first_move_keeps_it_pending() {
    let mut p = predictor();
    let start = p.position();
    p.predict(&WALK, 0.1, 0);
    let predicted = p.position();
    assert_eq!(p.pending()[0].sequence, 1);

    // Server has not applied anything yet: actor at the start, ack 0.
    p.reconcile(&view(start, Rotation::default(), 0));
    assert_eq!(p.pending().len(), 1);
    assert_eq!(p.pending()[0].sequence, 1);
    // Unmatched ack targets the server position, so the 5-unit error blends.
    assert!(close(p.position(), predicted + (start - predicted) * CORRECTION_BLEND));
}

/// Test: Acking the middle of five moves drops the older ones, keeps the
/// newer ones and shifts the current prediction by the server's error.
#[test]
fn test_ack_in_middle_of_five_moves() {
    let mut p = predictor();
    for frame in 0..5u64 {
        p.predict(&WALK, 0.02, frame * 20);
    }
    let sequences: Vec<u64> = p.pending().iter().map(|i| i.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);

    let third = p.pending()[2];
    let current = p.position();
    let correction = Vec3::new(0.5, 0.0, -0.3);
    let result = p.reconcile(&view(third.position + correction, third.rotation, 3));

    let remaining: Vec<u64> = p.pending().iter().map(|i| i.sequence).collect();
    assert_eq!(remaining, vec![4, 5]);
    let Reconciliation::Blended { error } = result else {
        panic!("expected a blend, got {result:?}");
    };
    assert!((error - correction.length()).abs() < 1e-4);
    // target = current + (server - buffered[3]), approached by one blend step
    let target = current + correction;
    assert!(close(p.position(), current + (target - current) * CORRECTION_BLEND));
}

/// Test: An unknown ack snaps straight to a distant server position.
#[test]
fn test_unmatched_ack_targets_server_position() {
    let mut p = predictor();
    p.predict(&WALK, 0.1, 0);

    let far = Vec3::new(30.0, 1.0, 30.0);
    let result = p.reconcile(&view(far, Rotation::default(), 99));
    assert!(matches!(result, Reconciliation::Snapped { .. }));
    assert!(close(p.position(), far));
    assert!(p.pending().is_empty());
}

/// Test: A small unmatched error blends instead of snapping.
#[test]
fn test_first_snapshot_blends_when_close() {
    let mut p = predictor();
    let result = p.reconcile(&view(Vec3::new(2.0, 1.0, 0.0), Rotation::default(), 0));
    assert!(matches!(result, Reconciliation::Blended { .. }));
    assert!(close(p.position(), Vec3::new(2.0 * CORRECTION_BLEND, 1.0, 0.0)));
}

/// Test: Rotation blends towards the server independently of position.
#[test]
fn test_rotation_blends() {
    let mut p = predictor();
    let result = p.reconcile(&view(Vec3::new(0.0, 1.0, 0.0), Rotation::new(0.0, 1.0), 5));
    assert_eq!(result, Reconciliation::Settled);
    assert!((p.rotation().yaw - CORRECTION_BLEND).abs() < 1e-6);
    assert!(p.rotation().pitch.abs() < 1e-6);
}

/// Test: The dead do not move or send.
#[test]
fn test_dead_player_is_frozen() {
    let mut p = predictor();
    let mut dead = view(Vec3::new(0.0, 1.0, 0.0), Rotation::default(), 0);
    dead.is_alive = false;
    p.reconcile(&dead);
    assert!(p.predict(&WALK, 0.1, 0).is_none());
    assert!(close(p.position(), Vec3::new(0.0, 1.0, 0.0)));
}

/// Test: Predicted moves sent to a real server come back acknowledged and in
/// agreement.
#[test]
fn test_round_trip_with_server() {
    let mut config = GameConfig::default();
    config.bots.counts = PerArchetype::default();
    let simulation = Simulation::with_layout(config, WorldSeed::new(8), open_layout(), None);
    let world = Arc::clone(simulation.world());
    let mut sync = NetSync::new(simulation);

    let mut session = Session::new();
    sync.handle(&mut session, ClientMessage::Join, 0);
    let id = session.player().unwrap().to_string();
    let start = sync.simulation().actor(&id).unwrap().position;
    let mut p = ClientPredictor::new(world, start, sync.client_config().look_sensitivity);

    for frame in 0..10u64 {
        let input = FrameInput {
            forward: 1.0,
            look_x: 3.0,
            ..FrameInput::default()
        };
        if let Some(message) = p.predict(&input, 0.016, frame * 16) {
            sync.handle(&mut session, message, frame * 16);
        }
    }

    let Envelope {
        body: ServerMessage::GameState { state },
        ..
    } = sync.game_state(200)
    else {
        panic!("expected gameState");
    };
    let me = state.player(&id).unwrap();
    assert_eq!(me.last_input_sequence, 10);
    assert_eq!(p.reconcile(me), Reconciliation::Settled);
    assert!(p.pending().is_empty());
}
