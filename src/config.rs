//! Decoder configuration
//!
//! The escape literal width and the stopping rule are explicit settings
//! rather than constants baked into the decoder.

use thiserror::Error;

use crate::pgm::ImageShape;

/// Literal width used by the reference encoder (one pixel byte).
pub const DEFAULT_LITERAL_BITS: u8 = 8;

/// Side of the reference image (512 × 512 greyscale).
pub const REFERENCE_IMAGE_SIDE: usize = 512;

/// When the decoder stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub enum Termination {
    /// Stop after exactly this many symbols, or earlier if the input ends
    /// cleanly between symbols.
    SymbolCount(usize),

    /// Decode until the input is exhausted; trailing bits that do not
    /// complete a symbol are treated as encoder padding.
    EndOfStream,
}

/// Errors raised by [`DecoderConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Literal width outside `1..=8`.
    #[error("literal width must be between 1 and 8 bits, got {0}")]
    LiteralWidth(u8),
}

/// Settings shared by a decode session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct DecoderConfig {
    /// Width of an escaped literal in bits.
    pub literal_bits: u8,

    /// Stopping rule.
    pub termination: Termination,
}

impl DecoderConfig {
    /// Stop after `count` symbols.
    pub fn with_symbol_count(count: usize) -> Self {
        Self {
            literal_bits: DEFAULT_LITERAL_BITS,
            termination: Termination::SymbolCount(count),
        }
    }

    /// Decode until the input runs out.
    pub fn until_end_of_stream() -> Self {
        Self {
            literal_bits: DEFAULT_LITERAL_BITS,
            termination: Termination::EndOfStream,
        }
    }

    /// Reference configuration: one symbol per pixel of the largest square
    /// image that fits in `pixel_count`.
    pub fn for_square_image(pixel_count: usize) -> Self {
        Self::with_symbol_count(ImageShape::square_for(pixel_count).pixel_count())
    }

    /// Override the literal width.
    pub fn literal_bits(mut self, bits: u8) -> Self {
        self.literal_bits = bits;
        self
    }

    /// Symbol bound, if the session has one.
    pub fn symbol_limit(&self) -> Option<usize> {
        match self.termination {
            Termination::SymbolCount(count) => Some(count),
            Termination::EndOfStream => None,
        }
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=8).contains(&self.literal_bits) {
            return Err(ConfigError::LiteralWidth(self.literal_bits));
        }
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::for_square_image(REFERENCE_IMAGE_SIDE * REFERENCE_IMAGE_SIDE)
    }
}
