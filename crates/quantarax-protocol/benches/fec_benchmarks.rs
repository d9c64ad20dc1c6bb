//! Forward error correction benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use quantarax_protocol::fec::{FecCodec, FecParams};

fn shards(k: usize, shard_len: usize) -> Vec<Vec<u8>> {
    (0..k).map(|i| vec![i as u8; shard_len]).collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("fec/encode");

    for (k, r, shard_len) in [(16, 8, 65536), (50, 6, 262144)] {
        let codec = FecCodec::new(FecParams { k, r }).unwrap();
        let data = shards(k, shard_len);
        group.throughput(Throughput::Bytes((k * shard_len) as u64));
        group.bench_with_input(format!("k={k},r={r},shard={shard_len}"), &data, |b, data| {
            b.iter(|| codec.encode(black_box(data)));
        });
    }

    group.finish();
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("fec/reconstruct");

    for (k, r, shard_len) in [(16, 8, 65536), (50, 6, 262144)] {
        let codec = FecCodec::new(FecParams { k, r }).unwrap();
        let data = shards(k, shard_len);
        let parity = codec.encode(&data).unwrap();

        group.throughput(Throughput::Bytes((k * shard_len) as u64));
        group.bench_function(format!("k={k},r={r},shard={shard_len},missing={r}"), |b| {
            b.iter_batched(
                || {
                    let mut all: Vec<Option<Vec<u8>>> =
                        data.iter().cloned().map(Some).chain(parity.iter().cloned().map(Some)).collect();
                    for slot in all.iter_mut().take(r) {
                        *slot = None;
                    }
                    all
                },
                |mut all| codec.reconstruct(black_box(&mut all)),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_reconstruct);
criterion_main!(benches);
