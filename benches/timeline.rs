//! Criterion benchmarks for the virtual-time core.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cdn_explorer::clock::Timeline;
use cdn_explorer::script::Script;
use cdn_explorer::shell::ExplorerShell;

/// Benchmark schedule + drain with varying queue depths.
fn bench_timeline_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline_drain");

    for depth in [16u64, 256, 4096].iter() {
        group.throughput(Throughput::Elements(*depth));

        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            b.iter(|| {
                let mut timeline = Timeline::new();
                for i in 0..depth {
                    // Interleaved deadlines so the heap has to reorder.
                    timeline.schedule_at((i * 7919) % depth, i);
                }
                let mut sum = 0u64;
                while let Some((_, e)) = timeline.pop_due(depth) {
                    sum = sum.wrapping_add(e);
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

/// Benchmark full scripted walkthroughs at different frame rates.
fn bench_tour(c: &mut Criterion) {
    let mut group = c.benchmark_group("tour");
    let script = Script::tour();

    for frame_ms in [16u64, 50, 250].iter() {
        group.bench_with_input(BenchmarkId::new("frame_ms", frame_ms), frame_ms, |b, &frame_ms| {
            b.iter(|| {
                let mut shell = ExplorerShell::new();
                let mut frames = 0u32;
                let report = script.run(&mut shell, frame_ms, |_| frames += 1);
                black_box((report.is_ok(), frames))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_timeline_drain, bench_tour);
criterion_main!(benches);
