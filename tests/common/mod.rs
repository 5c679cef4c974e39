#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bitvec::prelude::*;
use fgk_codec::AdaptiveTree;

/// Symbols used throughout the tests; 17 symbols, 7 distinct.
pub const REFERENCE_SEQUENCE: &[u8] = b"AAABDDHPBABDUUU H";

/// `REFERENCE_SEQUENCE` encoded with 8-bit literals, zero-padded to a byte.
pub const REFERENCE_STREAM: [u8; 13] = [
    0x41, 0x28, 0x5A, 0x26, 0xE9, 0x0E, 0xA0, 0x4F, 0xF5, 0x5D, 0x33, 0x90, 0x10,
];

/// Bits in `REFERENCE_STREAM` before padding.
pub const REFERENCE_STREAM_BITS: usize = 102;

/// One-pass FGK encoder sharing the decoder's tree.
#[derive(Debug)]
pub struct Encoder {
    tree: AdaptiveTree,
    literal_bits: u8,
    bits: BitVec<u8, Msb0>,
}

impl Encoder {
    pub fn new(literal_bits: u8) -> Self {
        Self {
            tree: AdaptiveTree::new(),
            literal_bits,
            bits: BitVec::new(),
        }
    }

    pub fn push(&mut self, symbol: u8) {
        match self.tree.code_for(symbol) {
            Some(code) => self.bits.extend(code),
            None => {
                self.bits.extend(self.tree.nyt_code());
                for shift in (0..self.literal_bits).rev() {
                    self.bits.push((symbol >> shift) & 1 == 1);
                }
            }
        }
        self.tree.observe(symbol);
    }

    pub fn tree(&self) -> &AdaptiveTree {
        &self.tree
    }

    /// Encoded length without padding.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Encoded bits, one `0`/`1` value per item.
    pub fn bit_values(&self) -> Vec<u8> {
        self.bits.iter().map(|bit| u8::from(*bit)).collect()
    }

    /// Encoded bytes; the last byte is zero-padded.
    pub fn finish(mut self) -> Vec<u8> {
        while self.bits.len() % 8 != 0 {
            self.bits.push(false);
        }
        self.bits.into_vec()
    }
}

/// Encode `symbols` with 8-bit literals and return the padded bytes.
pub fn encode(symbols: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder::new(8);
    for &symbol in symbols {
        encoder.push(symbol);
    }
    encoder.finish()
}

/// Tree after observing every symbol in order.
pub fn tree_after(symbols: &[u8]) -> AdaptiveTree {
    let mut tree = AdaptiveTree::new();
    for &symbol in symbols {
        tree.observe(symbol);
    }
    tree
}

/// Deterministic pseudo-image with smooth gradients and a few outliers.
pub fn synthetic_image(side: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_u32;
    (0..side * side)
        .map(|i| {
            let (row, col) = (i / side, i % side);
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if state % 97 == 0 {
                (state >> 24) as u8
            } else {
                ((row + col) / 4 % 256) as u8
            }
        })
        .collect()
}

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("FGK_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set FGK_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n").trim_end().to_string()
}
