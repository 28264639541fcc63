use criterion::{criterion_group, criterion_main, Criterion};

use oaf_sim::simple_diamond;

fn bench_step(c: &mut Criterion) {
    let mut scenario = simple_diamond();
    scenario.steps = 50;

    c.bench_function("diamond_50_steps", |b| {
        b.iter(|| {
            let _ = scenario.run().unwrap();
        })
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
