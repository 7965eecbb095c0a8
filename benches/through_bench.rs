//! Benchmarks for streamss-through.
//!
//! Run with:
//!     cargo bench

use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use streamss_through::{Chunk, Done, Encoding, Flush, Options, Transform, through, through_obj};

fn bench_byte_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("bytes");

    for size in [64 * 1024, 1024 * 1024] {
        // Deterministic pseudo-random data
        let data: Vec<u8> = (0..size).map(|i| (i * 7 + 13) as u8).collect();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(format!("passthrough_{}kb", size / 1024), &data, |b, data| {
            b.iter(|| {
                let stream = through(());
                let total = Rc::new(Cell::new(0usize));
                let sink = total.clone();
                stream.on_data(move |chunk| sink.set(sink.get() + chunk.len()));
                stream.pump(Cursor::new(black_box(data)), 16 * 1024).unwrap();
                black_box(total.get())
            });
        });

        group.bench_with_input(format!("count_flush_{}kb", size / 1024), &data, |b, data| {
            b.iter(|| {
                let count = Rc::new(Cell::new(0usize));
                let seen = count.clone();
                let stream = through((
                    Transform::sync(move |_, chunk, _| {
                        let zeros = chunk
                            .as_bytes()
                            .map_or(0, |b| b.iter().filter(|&&x| x == 0).count());
                        seen.set(seen.get() + zeros);
                        Ok(())
                    }),
                    Flush::sync(|_| Ok(())),
                ));
                stream.pump(Cursor::new(black_box(data)), 16 * 1024).unwrap();
                black_box(count.get())
            });
        });
    }

    group.finish();
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");
    let text: String = (0..20_000).map(|i| format!("línea {}\n", i)).collect();

    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("utf8_small_reads", |b| {
        b.iter(|| {
            let stream = through(Options::default().with_encoding(Encoding::Utf8));
            let total = Rc::new(Cell::new(0usize));
            let sink = total.clone();
            stream.on_data(move |chunk| sink.set(sink.get() + chunk.len()));
            // Odd read size splits multi-byte sequences
            stream.pump(Cursor::new(black_box(text.as_bytes())), 1021).unwrap();
            black_box(total.get())
        });
    });

    group.finish();
}

fn bench_object_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("objects");
    let n = 100_000u64;

    group.throughput(Throughput::Elements(n));
    group.bench_function("sync_records", |b| {
        b.iter(|| {
            let stream = through_obj(Transform::sync(|this, chunk, _| {
                let value = chunk.downcast_ref::<u64>().copied().unwrap_or_default();
                this.push(Chunk::record(value * 2));
                Ok(())
            }));
            let sum = Rc::new(Cell::new(0u64));
            let sink = sum.clone();
            stream.on_data(move |chunk| {
                sink.set(sink.get() + chunk.downcast_ref::<u64>().copied().unwrap_or_default())
            });
            for i in 0..n {
                stream.write(Chunk::record(i));
            }
            stream.end();
            black_box(sum.get())
        });
    });

    group.bench_function("deferred_records", |b| {
        b.iter(|| {
            let stream = through_obj(Transform::with_done(|this, chunk, _, done: Done| {
                this.push(chunk);
                done.ok();
            }));
            let count = Rc::new(Cell::new(0u64));
            let sink = count.clone();
            stream.on_data(move |_| sink.set(sink.get() + 1));
            for i in 0..n {
                stream.write(Chunk::record(i));
            }
            stream.end();
            black_box(count.get())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_byte_mode, bench_decoding, bench_object_mode);
criterion_main!(benches);
