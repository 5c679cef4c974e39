//! Bit sources feeding the decoder
//!
//! Compressed data is a flat bit sequence, most significant bit of each byte
//! first. [`ByteBits`] views raw bytes that way; [`BitValues`] wraps a stream
//! of individual bit values (one per item) and rejects anything that is not
//! `0` or `1`.

use std::fs;
use std::path::Path;

use bitvec::prelude::*;
use thiserror::Error;

use crate::IoError;

/// Errors produced while pulling bits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitSourceError {
    /// The source yielded something other than a bit.
    #[error("invalid bit value {value} at bit {position}")]
    InvalidInputFormat {
        /// Index of the offending bit.
        position: usize,
        /// Value found instead of 0 or 1.
        value: u8,
    },
}

/// Ordered supply of bits.
pub trait BitSource {
    /// Next bit, or `None` once the source is exhausted.
    fn next_bit(&mut self) -> Result<Option<bool>, BitSourceError>;

    /// Bits handed out so far.
    fn bits_consumed(&self) -> usize;

    /// Read `width` bits as an unsigned integer, MSB first.
    ///
    /// Returns `None` if the source runs dry part-way; the bits that were
    /// read are still counted as consumed.
    fn read_literal(&mut self, width: u8) -> Result<Option<u32>, BitSourceError> {
        debug_assert!(width <= 32, "literal wider than 32 bits");
        let mut value = 0u32;
        for _ in 0..width {
            match self.next_bit()? {
                Some(bit) => value = (value << 1) | u32::from(bit),
                None => return Ok(None),
            }
        }
        Ok(Some(value))
    }
}

impl<B: BitSource + ?Sized> BitSource for &mut B {
    fn next_bit(&mut self) -> Result<Option<bool>, BitSourceError> {
        (**self).next_bit()
    }

    fn bits_consumed(&self) -> usize {
        (**self).bits_consumed()
    }
}

/// Bytes read as an MSB-first bit sequence.
#[derive(Debug, Clone)]
pub struct ByteBits {
    bits: BitVec<u8, Msb0>,
    position: usize,
}

impl ByteBits {
    /// Wrap raw bytes; each byte contributes exactly 8 bits.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bits: BitVec::from_vec(bytes),
            position: 0,
        }
    }

    /// Total bits in the source.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True if the source holds no bits at all.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bits not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.position
    }
}

impl From<&[u8]> for ByteBits {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl BitSource for ByteBits {
    fn next_bit(&mut self) -> Result<Option<bool>, BitSourceError> {
        let bit = self.bits.get(self.position).map(|bit| *bit);
        if bit.is_some() {
            self.position += 1;
        }
        Ok(bit)
    }

    fn bits_consumed(&self) -> usize {
        self.position
    }
}

/// Bit values supplied one per item (e.g. an already-expanded bit list).
#[derive(Debug, Clone)]
pub struct BitValues<I> {
    values: I,
    position: usize,
}

impl<I: Iterator<Item = u8>> BitValues<I> {
    /// Wrap an iterator of bit values.
    pub fn new(values: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }
}

impl<I: Iterator<Item = u8>> BitSource for BitValues<I> {
    fn next_bit(&mut self) -> Result<Option<bool>, BitSourceError> {
        let Some(value) = self.values.next() else {
            return Ok(None);
        };
        let position = self.position;
        self.position += 1;
        match value {
            0 => Ok(Some(false)),
            1 => Ok(Some(true)),
            value => Err(BitSourceError::InvalidInputFormat { position, value }),
        }
    }

    fn bits_consumed(&self) -> usize {
        self.position
    }
}

/// Load a compressed file as a bit source.
pub fn read_bits<P: AsRef<Path>>(path: P) -> Result<ByteBits, IoError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| IoError::new(path, source))?;
    Ok(ByteBits::new(bytes))
}
