use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use echo_core::generation::generate_cave;
use echo_core::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_generate_cave(c: &mut Criterion) {
    let config = GameConfig::default();
    let mut group = c.benchmark_group("generate_cave");
    for depth in 1..=config.total_depths {
        group.bench_function(format!("depth{}", depth), |b| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                let mut rng = StdRng::seed_from_u64(seed);
                black_box(generate_cave(depth, &config, &mut rng))
            })
        });
    }
    group.finish();
}

fn bench_session_tick(c: &mut Criterion) {
    c.bench_function("tick_one_second_pinging", |b| {
        b.iter_batched(
            || {
                let mut session = Session::with_seed(GameConfig::default(), 0xECD0)
                    .expect("default config is valid");
                session.advance_or_restart();
                session
            },
            |mut session| {
                session.fire_ping();
                for _ in 0..60 {
                    black_box(session.tick(1.0 / 60.0, TickInput::moving(1.0, -1.0)));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_generate_cave, bench_session_tick);
criterion_main!(benches);
