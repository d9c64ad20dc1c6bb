//! Cryptography benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use quantarax_crypto::{
    hash::blake3,
    kem::X25519KeyPair,
    symmetric::{nonce::derive_nonce, seal},
};

fn bench_blake3(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash/blake3");

    for size in [1024, 65536, 1048576] {
        let data = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(format!("{} bytes", size), &data, |b, data| {
            b.iter(|| blake3::hash(black_box(data)));
        });
    }

    group.finish();
}

fn bench_aes_gcm(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric/aes-gcm");
    let key = [0u8; 32];
    let nonce = [1u8; 12];

    for size in [1024, 65536, 1048576] {
        let data = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(format!("{} bytes", size), &data, |b, data| {
            b.iter(|| seal(black_box(&key), &nonce, black_box(data), &[]));
        });
    }

    group.finish();
}

fn bench_nonce_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric/nonce");
    let iv_base = [7u8; 12];

    group.bench_function("derive_nonce", |b| {
        b.iter(|| derive_nonce(black_box(&iv_base), black_box(42), false));
    });

    group.finish();
}

fn bench_x25519(c: &mut Criterion) {
    let mut group = c.benchmark_group("kem/x25519");

    group.bench_function("keygen", |b| {
        b.iter(X25519KeyPair::generate);
    });

    let alice = X25519KeyPair::generate();
    let bob = X25519KeyPair::generate();

    group.bench_function("exchange", |b| {
        b.iter(|| alice.exchange(black_box(bob.public_key())));
    });

    group.finish();
}

fn bench_chunk_encryption(c: &mut Criterion) {
    let mut group = c.benchmark_group("file/chunk-encryption");
    let key = [0u8; 32];
    let iv_base = [3u8; 12];

    for chunk_size in [65536, 262144, 1048576] {
        let data = vec![0u8; chunk_size];
        group.throughput(Throughput::Bytes(chunk_size as u64));
        group.bench_with_input(format!("{} byte chunks", chunk_size), &data, |b, data| {
            b.iter(|| {
                let nonce = derive_nonce(&iv_base, 0, false);
                seal(black_box(&key), &nonce, black_box(data), &[])
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_blake3,
    bench_aes_gcm,
    bench_nonce_derivation,
    bench_x25519,
    bench_chunk_encryption
);
criterion_main!(benches);
