//! Rolling window benchmarks
//!
//! Run with: `cargo bench --bench collections_bench -p weavelink-common
//! --features foundation`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use weavelink_common::collections::RollingWindow;

fn bench_rolling_window_push_and_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_window_push_mean");

    for capacity in [5usize, 50, 500] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &cap| {
            let mut window = RollingWindow::new(cap);
            let mut sample = 0.0_f64;
            b.iter(|| {
                sample += 0.001;
                window.push(black_box(sample));
                black_box(window.mean())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rolling_window_push_and_mean);
criterion_main!(benches);
