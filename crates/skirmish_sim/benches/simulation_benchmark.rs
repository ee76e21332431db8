//! Simulation step benchmarks.
//!
//! A full step with a busy bot population must stay far below the 16.6 ms
//! tick budget.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skirmish_sim::config::PerArchetype;
use skirmish_sim::{GameConfig, Simulation};
use skirmish_world::{WorldConfig, WorldGenerator, WorldSeed};

fn busy_simulation(per_archetype: u32) -> Simulation {
    let layout = WorldGenerator::new(WorldSeed::new(9), 120.0, 1.0, WorldConfig::default())
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
    let mut sim = Simulation::with_layout(config, WorldSeed::new(9), layout, None);
    // Warm up so bullets are in flight.
    for tick in 0..120u64 {
        sim.step(1_000_000 + tick * 16);
    }
    sim
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_step");
    for per_archetype in [1u32, 4, 10] {
        let mut sim = busy_simulation(per_archetype);
        let mut now = 2_000_000u64;
        group.bench_with_input(
            BenchmarkId::from_parameter(per_archetype * 6),
            &per_archetype,
            |b, _| {
                b.iter(|| {
                    now += 16;
                    black_box(sim.step(now))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
