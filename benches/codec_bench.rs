//! Criterion benchmark for the collection codec
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ndstash::protocol::{Decoder, Encoder};
use ndstash::{NdArray, NdList};

fn named_list(entries: usize, len: i32) -> NdList {
    (0..entries)
        .map(|i| (format!("array {i}"), NdArray::arange(len)))
        .collect()
}

fn bench_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let list = named_list(10, 25);
    let encoded = ndstash::encode(&list).unwrap();
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    // Reused encoder, no allocation after the first iteration
    group.bench_function("encode_reuse", |b| {
        let mut encoder = Encoder::with_capacity(encoded.len());
        b.iter(|| {
            encoder.reset();
            black_box(encoder.encode(black_box(&list)).unwrap().len());
        });
    });

    group.bench_function("encode_fresh", |b| {
        b.iter(|| black_box(ndstash::encode(black_box(&list)).unwrap()));
    });

    group.bench_function("decode_owned", |b| {
        b.iter(|| black_box(Decoder::new(black_box(&encoded)).decode_list().unwrap()));
    });

    group.bench_function("decode_views", |b| {
        b.iter(|| {
            let entries = Decoder::new(black_box(&encoded)).entries().unwrap();
            for view in entries {
                black_box(view.unwrap().data.len());
            }
        });
    });

    group.finish();
}

fn bench_array_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_size");

    for len in [25, 10_000, 1_000_000].iter() {
        let list = named_list(2, *len);
        let encoded = ndstash::encode(&list).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_function(format!("roundtrip_{}", len), |b| {
            b.iter(|| {
                let bytes = ndstash::encode(black_box(&list)).unwrap();
                black_box(ndstash::decode(&bytes).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode_decode, bench_array_sizes);
criterion_main!(benches);
