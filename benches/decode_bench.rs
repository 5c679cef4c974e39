//! Decoder and tree update throughput

use bitvec::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fgk_codec::{decode_bytes, AdaptiveTree, DecoderConfig};

/// Smooth gradient with a sprinkling of noise, like a natural greyscale image
fn gradient_image(side: usize) -> Vec<u8> {
    (0..side * side)
        .map(|i| {
            let (row, col) = (i / side, i % side);
            let noise = (i.wrapping_mul(2_654_435_761) >> 7) % 5;
            ((row + col) / 4 + noise) as u8
        })
        .collect()
}

/// Every byte value in turn; the tree grows to its full size
fn uniform_image(side: usize) -> Vec<u8> {
    (0..side * side).map(|i| (i * 37 % 256) as u8).collect()
}

fn encode(symbols: &[u8]) -> Vec<u8> {
    let mut tree = AdaptiveTree::new();
    let mut bits: BitVec<u8, Msb0> = BitVec::new();
    for &symbol in symbols {
        match tree.code_for(symbol) {
            Some(code) => bits.extend(code),
            None => {
                bits.extend(tree.nyt_code());
                bits.extend((0..8).rev().map(|shift| (symbol >> shift) & 1 == 1));
            }
        }
        tree.observe(symbol);
    }
    while bits.len() % 8 != 0 {
        bits.push(false);
    }
    bits.into_vec()
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for side in [64, 256] {
        for (name, pixels) in [("gradient", gradient_image(side)), ("uniform", uniform_image(side))] {
            let bytes = encode(&pixels);
            group.throughput(Throughput::Elements(pixels.len() as u64));
            group.bench_with_input(BenchmarkId::new(name, side), &bytes, |b, bytes| {
                b.iter(|| {
                    let config = DecoderConfig::for_square_image(side * side);
                    black_box(decode_bytes(black_box(bytes), config))
                });
            });
        }
    }

    group.finish();
}

fn benchmark_observe(c: &mut Criterion) {
    let pixels = gradient_image(128);
    let mut group = c.benchmark_group("observe");
    group.throughput(Throughput::Elements(pixels.len() as u64));
    group.bench_function("gradient_128", |b| {
        b.iter(|| {
            let mut tree = AdaptiveTree::new();
            for &pixel in &pixels {
                tree.observe(black_box(pixel));
            }
            black_box(tree.total_weight())
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_decode, benchmark_observe);
criterion_main!(benches);
