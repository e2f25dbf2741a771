use criterion::{criterion_group, criterion_main, Criterion};
use dosecurve::prelude::*;
use std::hint::black_box;

fn day() -> TimeAxis {
    TimeAxis::with_resolution(8.0, 32.0, 1.0).unwrap()
}

fn dex_schedule() -> Schedule {
    Schedule::builder().dose(8.0, 5.0).repeat(4, 1.5).build()
}

fn criterion_benchmark(c: &mut Criterion) {
    let axis = day();
    let schedule = dex_schedule();
    let rates = DrugProfile::dex().pk;

    c.bench_function("schedule_curve 5 doses", |b| {
        b.iter(|| schedule_curve(black_box(&axis), black_box(&schedule), &rates))
    });

    let pk = schedule_curve(&axis, &schedule, &rates);
    let options = PerceivedOptions::default();
    c.bench_function("perceive dex kernel", |b| {
        b.iter(|| perceive(black_box(&pk), &Kernel::dex(), &options).unwrap())
    });

    let parts = dose_curves(&axis, &schedule, &rates);
    c.bench_function("perceive_sum vyvanse kernel", |b| {
        b.iter(|| perceive_sum(&axis, black_box(&parts), &Kernel::vyvanse(), &options).unwrap())
    });

    for kind in ChartKind::ALL {
        let scenario = Scenario::preset(kind);
        c.bench_function(&format!("chart {kind}"), |b| {
            b.iter(|| black_box(&scenario).chart().unwrap())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
