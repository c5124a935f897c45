//! Log benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use seglog_bench::utils::{filled_log, random_data, temp_log};
use seglog_core::Record;
use std::io::Read;

/// Benchmark appends across segment rotations.
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_append");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (_dir, log) = temp_log(1024 * 1024);
            let data = random_data(size);

            b.iter(|| {
                let offset = log.append(Record::new(black_box(data.clone()))).unwrap();
                black_box(offset);
            });
        });
    }

    group.finish();
}

/// Benchmark sequential reads.
fn bench_read_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_read_sequential");

    for count in [100usize, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (_dir, log) = filled_log(count, 256);

            b.iter(|| {
                for offset in 0..count as u64 {
                    black_box(log.read(offset).unwrap());
                }
            });
        });
    }

    group.finish();
}

/// Benchmark random reads, which exercise the segment search.
fn bench_read_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_read_random");
    let count = 5000usize;

    group.bench_function("256B", |b| {
        let (_dir, log) = filled_log(count, 256);
        let mut rng = rand::thread_rng();

        b.iter(|| {
            let offset = rng.gen_range(0..count as u64);
            black_box(log.read(black_box(offset)).unwrap());
        });
    });

    group.finish();
}

/// Benchmark draining the raw reader.
fn bench_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_reader");
    let (_dir, log) = filled_log(2000, 512);
    let total: u64 = log.segments().iter().map(|s| s.store_size).sum();
    group.throughput(Throughput::Bytes(total));

    group.bench_function("read_to_end", |b| {
        b.iter(|| {
            let mut bytes = Vec::with_capacity(total as usize);
            log.reader().read_to_end(&mut bytes).unwrap();
            black_box(bytes);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_append,
    bench_read_sequential,
    bench_read_random,
    bench_reader
);
criterion_main!(benches);
