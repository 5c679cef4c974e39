//! # Adaptive Huffman (FGK) image decoder
//!
//! Decompresses a bit stream produced by a one-pass adaptive Huffman encoder
//! back into the pixels of a square greyscale image.
//!
//! ## Core Algorithm
//!
//! 1. **Adaptive tree**: encoder and decoder start from the same empty tree
//!    and update it identically after every symbol, so no code table is ever
//!    transmitted.
//! 2. **Sibling property**: nodes are numbered so that weights never decrease
//!    with the number; `observe` swaps a node with the highest-numbered peer
//!    of equal weight before incrementing it.
//! 3. **Escape literals**: a symbol seen for the first time is sent as the
//!    path to the NYT leaf followed by a fixed-width literal.
//!
//! ## Usage Example
//!
//! ```
//! use fgk_codec::{decode_bytes, DecoderConfig};
//!
//! // 'A' as a literal, then seven more 'A's (path `0` each)
//! let outcome = decode_bytes(&[0x41, 0x00], DecoderConfig::with_symbol_count(8))?;
//! assert_eq!(outcome.symbols, vec![b'A'; 8]);
//! # Ok::<(), fgk_codec::DecodeError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod bits;     // Bit sources
pub mod config;   // Session settings
pub mod decoder;  // Tree walk and escape handling
pub mod pgm;      // Output image container
pub mod tree;     // Adaptive Huffman tree

// Re-exports for convenience
pub use bits::{read_bits, BitSource, BitSourceError, BitValues, ByteBits};
pub use config::{ConfigError, DecoderConfig, Termination};
pub use decoder::{decode_bytes, DecodeError, DecodeOutcome, Decoder};
pub use pgm::{write_image, ImageShape, PgmError, PgmImage};
pub use tree::{AdaptiveTree, LeafValue, Node, NodeId, NodeSnapshot, SiblingPropertyViolation};

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Filesystem failure in one of the I/O helpers, tagged with the path.
#[derive(Debug, Error)]
#[error("I/O error on {}: {source}", .path.display())]
pub struct IoError {
    /// File that could not be read or written.
    pub path: PathBuf,
    /// Underlying error.
    #[source]
    pub source: io::Error,
}

impl IoError {
    /// Attach `path` to an I/O error.
    pub fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = IoError::new(
            Path::new("/tmp/missing.bin"),
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.to_string(), "I/O error on /tmp/missing.bin: not found");
    }
}
