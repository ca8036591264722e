use ab_pos_plot::{F1, ForwardPropagator, Fx, Header, MemoryStorage};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_f1(c: &mut Criterion) {
    let mut group = c.benchmark_group("f1");
    let seed = [7u8; 32];
    let f1 = F1::new(&seed);

    group.bench_function("eval/k18", |b| {
        b.iter(|| black_box(f1.eval(black_box(12345), 18)));
    });
    group.finish();
}

fn bench_fx(c: &mut Criterion) {
    let mut group = c.benchmark_group("fx");
    let seed = [3u8; 32];
    let fx = Fx::new(&seed);

    group.bench_function("hash/k18", |b| {
        b.iter(|| black_box(fx.hash(18, 18, black_box(0xABCDEF), black_box(0x123456))));
    });
    group.finish();
}

fn bench_table2_match_and_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("table");
    group.sample_size(10);
    let seed = [2u8; 32];
    let k = 18;

    group.bench_function("t2/match+sort/k18", |b| {
        b.iter(|| {
            let storage = MemoryStorage::new();
            let propagator = ForwardPropagator::new(&storage, seed, k, 64 * 1024 * 1024);
            let mut header = Header::new(seed, k).unwrap();
            header.write(&storage).unwrap();
            propagator.write_t1(&mut header).unwrap();
            black_box(propagator.propagate_table(2, &mut header).unwrap());
        });
    });
    group.finish();
}

fn bench_small_plot(c: &mut Criterion) {
    let mut group = c.benchmark_group("plot");
    group.sample_size(10);

    group.bench_function("build/k18", |b| {
        b.iter(|| {
            let storage = MemoryStorage::new();
            let plotter = ab_pos_plot::Plotter::new([1u8; 32], 18, 64 * 1024 * 1024).unwrap();
            black_box(plotter.run(&storage, false, None).unwrap());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_f1,
    bench_fx,
    bench_table2_match_and_sort,
    bench_small_plot
);
criterion_main!(benches);
