//! Snapshot benchmarks.
//!
//! Capturing and encoding a `gameState` happens 30 times a second under the
//! shared lock, so it has to stay cheap with a crowded arena.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skirmish_net::protocol::encode;
use skirmish_net::NetSync;
use skirmish_sim::config::PerArchetype;
use skirmish_sim::{GameConfig, Simulation};
use skirmish_world::{WorldConfig, WorldGenerator, WorldSeed};

fn crowded(per_archetype: u32) -> NetSync {
    let layout = WorldGenerator::new(WorldSeed::new(3), 120.0, 1.0, WorldConfig::default())
        .generate_at(0)
        .expect("layout");
    let mut config = GameConfig::default();
    config.bots.counts = PerArchetype {
        dumb: per_archetype,
        simple: per_archetype,
        seeking: per_archetype,
        teleporting: per_archetype,
        danger: per_archetype,
        monsters: per_archetype,
    };
    let mut sync = NetSync::new(Simulation::with_layout(config, WorldSeed::new(3), layout, None));
    for tick in 0..240u64 {
        sync.step(1_000_000 + tick * 16);
    }
    sync
}

fn bench_game_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("game_state");
    for per_archetype in [1u32, 5, 15] {
        let mut sync = crowded(per_archetype);
        group.bench_with_input(
            BenchmarkId::new("capture_and_encode", per_archetype * 6),
            &per_archetype,
            |b, _| {
                b.iter(|| {
                    let envelope = sync.game_state(2_000_000);
                    black_box(encode(&envelope).expect("encode"))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_game_state);
criterion_main!(benches);
