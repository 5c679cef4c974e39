//! End-to-end decoding: bytes in, symbols and images out

mod common;

use common::*;
use fgk_codec::*;

#[test]
fn test_encoder_matches_reference_stream() {
    let mut encoder = Encoder::new(8);
    for &symbol in REFERENCE_SEQUENCE {
        encoder.push(symbol);
    }
    assert_eq!(encoder.bit_len(), REFERENCE_STREAM_BITS);
    assert_eq!(encoder.finish(), REFERENCE_STREAM.to_vec());
}

#[test]
fn test_reference_stream_decodes_exactly() {
    let config = DecoderConfig::with_symbol_count(REFERENCE_SEQUENCE.len());
    let outcome = decode_bytes(&REFERENCE_STREAM, config).expect("reference stream decodes");

    assert_eq!(outcome.symbols, REFERENCE_SEQUENCE);
    assert_eq!(outcome.escapes, 7);
    // The padding after the last symbol is never touched
    assert_eq!(outcome.bits_consumed, REFERENCE_STREAM_BITS);
}

#[test]
fn test_reference_stream_until_end_discards_padding() {
    let outcome = decode_bytes(&REFERENCE_STREAM, DecoderConfig::until_end_of_stream())
        .expect("padding is tolerated");
    assert_eq!(outcome.symbols, REFERENCE_SEQUENCE);
    assert_eq!(outcome.bits_consumed, REFERENCE_STREAM.len() * 8);
}

#[test]
fn test_decoder_tree_matches_encoder_tree() {
    let mut encoder = Encoder::new(8);
    for &symbol in REFERENCE_SEQUENCE {
        encoder.push(symbol);
    }

    let mut decoder = Decoder::new(DecoderConfig::with_symbol_count(REFERENCE_SEQUENCE.len()))
        .expect("valid config");
    decoder
        .decode(ByteBits::from(&REFERENCE_STREAM[..]))
        .expect("decode succeeds");

    assert_eq!(decoder.tree().snapshot(), encoder.tree().snapshot());
    assert_eq!(decoder.tree().fingerprint(), encoder.tree().fingerprint());
    decoder
        .tree()
        .check_invariants()
        .expect("decoder tree keeps the sibling property");
}

#[test]
fn test_decode_is_deterministic() {
    let pixels = synthetic_image(32);
    let bytes = encode(&pixels);

    let fingerprints: std::collections::HashSet<_> = (0..4)
        .map(|_| {
            let mut decoder =
                Decoder::new(DecoderConfig::for_square_image(pixels.len())).expect("valid config");
            let outcome = decoder.decode(ByteBits::from(&bytes[..])).expect("decode succeeds");
            assert_eq!(outcome.symbols, pixels);
            decoder.tree().fingerprint()
        })
        .collect();
    assert_eq!(fingerprints.len(), 1, "tree diverged across runs");
}

#[test]
fn test_file_to_pgm() {
    let side = 48;
    let pixels = synthetic_image(side);
    let dir = tempfile::tempdir().expect("create temp dir");
    let input = dir.path().join("image.fgk");
    let output = dir.path().join("image.pgm");
    std::fs::write(&input, encode(&pixels)).expect("write compressed input");

    let bits = read_bits(&input).expect("read compressed input");
    let outcome = Decoder::new(DecoderConfig::for_square_image(side * side))
        .expect("valid config")
        .decode(bits)
        .expect("decode succeeds");
    write_image(outcome.symbols, side, side, &output).expect("write image");

    let written = std::fs::read(&output).expect("read image back");
    assert!(written.starts_with(b"P5\n48 48\n255\n"));
    let image = PgmImage::parse(&written).expect("valid PGM");
    assert_eq!(image.shape(), ImageShape { width: side, height: side });
    assert_eq!(image.pixels(), pixels.as_slice());
}

#[test]
fn test_short_input_cannot_fill_image() {
    let pixels = synthetic_image(8);
    let mut encoder = Encoder::new(8);
    for &pixel in &pixels[..40] {
        encoder.push(pixel);
    }

    let mut decoder = Decoder::new(DecoderConfig::for_square_image(64)).expect("valid config");
    let outcome = decoder
        .decode(BitValues::new(encoder.bit_values()))
        .expect("input ends between symbols");
    assert_eq!(outcome.symbols, &pixels[..40]);
    assert_eq!(decoder.decoded(), 40);

    let err = write_image(outcome.symbols, 8, 8, std::env::temp_dir().join("fgk-short.pgm"))
        .expect_err("too few pixels");
    assert!(matches!(err, PgmError::SizeMismatch { expected: 64, .. }));
}

#[test]
fn test_all_byte_values_round_trip() {
    let symbols: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
    let outcome = decode_bytes(&encode(&symbols), DecoderConfig::with_symbol_count(symbols.len()))
        .expect("decode succeeds");
    assert_eq!(outcome.symbols, symbols);
    assert_eq!(outcome.escapes, 256);
}
