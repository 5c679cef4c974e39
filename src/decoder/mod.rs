//! Symbol decoder
//!
//! Each symbol is found by walking the adaptive tree from the root, one bit
//! per edge (`0` → child0, `1` → child1), until a node without children is
//! reached. The escape leaf (or the still-empty root) means a fixed-width
//! literal follows in the stream. Every decoded symbol is fed back into the
//! tree before the next walk starts, mirroring the encoder.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bits::{BitSource, BitSourceError, ByteBits};
use crate::config::{ConfigError, DecoderConfig, Termination};
use crate::tree::{AdaptiveTree, LeafValue, Node, NodeId};

/// Errors that abort a decode session.
///
/// The tree state is cumulative, so no error is recoverable: every symbol
/// after a gap would decode against the wrong tree.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bit source produced a value that is not a bit.
    #[error(transparent)]
    InvalidInputFormat(#[from] BitSourceError),

    /// Input ran out in the middle of a tree walk or a literal.
    #[error("bit stream ends after {decoded} complete symbols ({bits_consumed} bits read)")]
    TruncatedStream {
        /// Symbols completed before the truncated one.
        decoded: usize,
        /// Bits consumed when the source ran dry.
        bits_consumed: usize,
    },

    /// The session configuration was rejected.
    #[error("invalid decoder configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Result of a decode run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Decoded symbols, in stream order.
    pub symbols: Vec<u8>,
    /// Bits read from the source, including any discarded padding.
    pub bits_consumed: usize,
    /// Symbols that arrived as escaped literals.
    pub escapes: usize,
}

#[derive(Debug, Clone, Copy)]
enum WalkState {
    /// Consuming bits to pick a branch.
    Descending(NodeId),
    /// Reached a node without children.
    Resolved(NodeId),
}

/// Decode session: owns the adaptive tree for its whole lifetime.
#[derive(Debug)]
pub struct Decoder {
    tree: AdaptiveTree,
    config: DecoderConfig,
    decoded: usize,
    escapes: usize,
}

impl Decoder {
    /// Start a session with an empty tree.
    pub fn new(config: DecoderConfig) -> Result<Self, DecodeError> {
        config.validate()?;
        Ok(Self {
            tree: AdaptiveTree::new(),
            config,
            decoded: 0,
            escapes: 0,
        })
    }

    /// Current tree.
    pub fn tree(&self) -> &AdaptiveTree {
        &self.tree
    }

    /// Session settings.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Symbols decoded so far in this session.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Give up the session and keep the tree.
    pub fn into_tree(self) -> AdaptiveTree {
        self.tree
    }

    /// Decode one symbol and update the tree.
    ///
    /// Returns `Ok(None)` if the source is exhausted before the first bit of
    /// the symbol; running dry after that is [`DecodeError::TruncatedStream`].
    pub fn decode_symbol<B: BitSource>(&mut self, bits: &mut B) -> Result<Option<u8>, DecodeError> {
        let start = bits.bits_consumed();

        let mut state = WalkState::Descending(self.tree.root());
        let reached = loop {
            state = match state {
                WalkState::Descending(id) => match self.tree.node(id).children() {
                    None => WalkState::Resolved(id),
                    Some(children) => match bits.next_bit()? {
                        Some(bit) => WalkState::Descending(children[usize::from(bit)]),
                        None => return self.exhausted(bits, start),
                    },
                },
                WalkState::Resolved(id) => break id,
            };
        };

        let known = match self.tree.node(reached) {
            Node::Leaf {
                value: LeafValue::Symbol(symbol),
                ..
            } => Some(*symbol),
            // Escape leaf, or the childless root of a fresh tree.
            _ => None,
        };
        let symbol = match known {
            Some(symbol) => symbol,
            None => match bits.read_literal(self.config.literal_bits)? {
                Some(literal) => {
                    self.escapes += 1;
                    debug!(symbol = literal, position = self.decoded, "escaped literal");
                    literal as u8
                }
                None => return self.exhausted(bits, start),
            },
        };

        self.tree.observe(symbol);
        self.decoded += 1;
        Ok(Some(symbol))
    }

    /// Decode until the configured stopping rule is met.
    pub fn decode<B: BitSource>(&mut self, mut bits: B) -> Result<DecodeOutcome, DecodeError> {
        let limit = self.config.symbol_limit();
        let escapes_before = self.escapes;
        let mut symbols = Vec::with_capacity(limit.unwrap_or(0).min(1 << 20));

        while limit.map_or(true, |limit| symbols.len() < limit) {
            match self.decode_symbol(&mut bits) {
                Ok(Some(symbol)) => symbols.push(symbol),
                Ok(None) => {
                    if let Some(limit) = limit {
                        warn!(decoded = symbols.len(), expected = limit, "input ended before the symbol bound");
                    }
                    break;
                }
                Err(DecodeError::TruncatedStream { bits_consumed, .. })
                    if self.config.termination == Termination::EndOfStream =>
                {
                    debug!(bits_consumed, "discarding trailing padding");
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        let outcome = DecodeOutcome {
            symbols,
            bits_consumed: bits.bits_consumed(),
            escapes: self.escapes - escapes_before,
        };
        info!(
            symbols = outcome.symbols.len(),
            bits = outcome.bits_consumed,
            escapes = outcome.escapes,
            distinct = self.tree.symbol_count(),
            "decode finished"
        );
        Ok(outcome)
    }

    fn exhausted<B: BitSource>(&self, bits: &B, start: usize) -> Result<Option<u8>, DecodeError> {
        let bits_consumed = bits.bits_consumed();
        if bits_consumed == start {
            Ok(None)
        } else {
            Err(DecodeError::TruncatedStream {
                decoded: self.decoded,
                bits_consumed,
            })
        }
    }
}

/// Decode a compressed byte buffer in one call.
pub fn decode_bytes(bytes: &[u8], config: DecoderConfig) -> Result<DecodeOutcome, DecodeError> {
    Decoder::new(config)?.decode(ByteBits::from(bytes))
}
