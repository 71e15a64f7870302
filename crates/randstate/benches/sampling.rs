//! Criterion benchmarks for the replay facade.
//!
//! Measures per-sample cost over a cheap 64-bit engine so the numbers
//! reflect adapter and sampler overhead rather than engine quality.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use randstate::{FnEngine, RandomState};

fn splitmix_state(seed: u64) -> RandomState<FnEngine<u64, impl FnMut() -> u64>> {
    let mut s = seed;
    RandomState::new(FnEngine::new(move || {
        s = s.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = s;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }))
    .expect("64-bit scalar engines always construct")
}

fn bench_raw_stream(c: &mut Criterion) {
    let state = splitmix_state(1);
    c.bench_function("raw/next_u64", |b| b.iter(|| black_box(state.next_u64())));
    c.bench_function("raw/random_sample", |b| {
        b.iter(|| black_box(state.random_sample()))
    });
}

fn bench_bounded(c: &mut Criterion) {
    let state = splitmix_state(2);
    let mut group = c.benchmark_group("rand_int");

    group.bench_function("u64_masked", |b| {
        b.iter(|| state.rand_int(black_box(0_u64), black_box(1 << 40)).unwrap())
    });
    group.bench_function("u8_buffered", |b| {
        b.iter(|| state.rand_int(black_box(0_u8), black_box(100)).unwrap())
    });

    for len in [64usize, 4096] {
        group.bench_with_input(BenchmarkId::new("fill_u32_lemire", len), &len, |b, &len| {
            let mut out = vec![0u32; len];
            b.iter(|| {
                state
                    .rand_int_fill(0_u32, 999_999, false, black_box(&mut out))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_distributions(c: &mut Criterion) {
    let state = splitmix_state(3);
    let mut group = c.benchmark_group("distributions");

    group.bench_function("rand_n", |b| b.iter(|| black_box(state.rand_n())));
    group.bench_function("gamma_2_5", |b| {
        b.iter(|| state.gamma(black_box(2.5), black_box(1.0)).unwrap())
    });
    group.bench_function("beta_0_5_0_5", |b| {
        b.iter(|| state.beta(black_box(0.5), black_box(0.5)).unwrap())
    });
    group.bench_function("binomial_inversion", |b| {
        b.iter(|| state.binomial(black_box(20), black_box(0.3)).unwrap())
    });
    group.bench_function("binomial_btpe", |b| {
        b.iter(|| state.binomial(black_box(10_000), black_box(0.4)).unwrap())
    });
    group.bench_function("hypergeometric_hrua", |b| {
        b.iter(|| {
            state
                .hypergeometric(black_box(600), black_box(400), black_box(300))
                .unwrap()
        })
    });
    group.bench_function("vonmises_kappa_4", |b| {
        b.iter(|| state.vonmises(black_box(0.0), black_box(4.0)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_raw_stream, bench_bounded, bench_distributions);
criterion_main!(benches);
