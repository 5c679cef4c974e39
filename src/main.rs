use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fgk_codec::config::{DEFAULT_LITERAL_BITS, REFERENCE_IMAGE_SIDE};
use fgk_codec::{read_bits, AdaptiveTree, Decoder, DecoderConfig, ImageShape, PgmImage};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fgk", about = "Adaptive Huffman (FGK) decoder for square greyscale images")]
struct Cli {
    /// Log tree updates and escaped literals.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a compressed file into a PGM image.
    Decode {
        /// Compressed input.
        input: PathBuf,
        /// PGM file to write.
        output: PathBuf,
        /// Pixel count of the square image (default: 512 x 512).
        #[arg(long, conflicts_with = "side")]
        pixels: Option<usize>,
        /// Side length of the square image.
        #[arg(long)]
        side: Option<usize>,
        /// Width of escaped literals in bits.
        #[arg(long, default_value_t = DEFAULT_LITERAL_BITS)]
        literal_bits: u8,
        /// Decode until the input ends instead of stopping at the pixel count.
        #[arg(long)]
        until_eof: bool,
    },
    /// Feed symbols through the tree and print it after every update.
    Trace {
        /// Symbols to observe (each byte is one symbol).
        symbols: String,
    },
    /// Print the code of every symbol after observing a sequence.
    Codes {
        /// Symbols to observe (each byte is one symbol).
        symbols: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Decode {
            input,
            output,
            pixels,
            side,
            literal_bits,
            until_eof,
        } => {
            let pixel_count = requested_pixels(pixels, side)?;
            run_decode(input, output, pixel_count, literal_bits, until_eof)?
        }
        Commands::Trace { symbols } => run_trace(&symbols),
        Commands::Codes { symbols } => run_codes(&symbols),
    }

    Ok(())
}

/// Pixel count from `--pixels` / `--side`, defaulting to the reference image.
fn requested_pixels(pixels: Option<usize>, side: Option<usize>) -> Result<usize> {
    match (pixels, side) {
        (_, Some(side)) => side
            .checked_mul(side)
            .with_context(|| format!("--side {} gives more pixels than fit in memory", side)),
        (Some(pixels), None) => Ok(pixels),
        (None, None) => Ok(REFERENCE_IMAGE_SIDE * REFERENCE_IMAGE_SIDE),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_decode(
    input: PathBuf,
    output: PathBuf,
    pixel_count: usize,
    literal_bits: u8,
    until_eof: bool,
) -> Result<()> {
    let shape = ImageShape::square_for(pixel_count);
    let config = if until_eof {
        DecoderConfig::until_end_of_stream()
    } else {
        DecoderConfig::with_symbol_count(shape.pixel_count())
    }
    .literal_bits(literal_bits);

    let bits = read_bits(&input)
        .with_context(|| format!("failed to read compressed data from {}", input.display()))?;
    let mut decoder = Decoder::new(config).context("failed to initialize decoder")?;
    let mut outcome = decoder
        .decode(bits)
        .with_context(|| format!("decoding {} failed", input.display()))?;

    let expected = shape.pixel_count();
    if outcome.symbols.len() < expected {
        bail!(
            "{} holds only {} of {} pixels for a {}x{} image",
            input.display(),
            outcome.symbols.len(),
            expected,
            shape.width,
            shape.height
        );
    }
    if outcome.symbols.len() > expected {
        warn!(
            extra = outcome.symbols.len() - expected,
            "dropping symbols beyond the image size"
        );
        outcome.symbols.truncate(expected);
    }

    let image = PgmImage::new(shape, outcome.symbols).context("decoded data does not fit the image")?;
    image
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    info!(
        width = shape.width,
        height = shape.height,
        bits = outcome.bits_consumed,
        "wrote {}",
        output.display()
    );
    Ok(())
}

fn run_trace(symbols: &str) {
    let mut tree = AdaptiveTree::new();
    for (step, &symbol) in symbols.as_bytes().iter().enumerate() {
        tree.observe(symbol);
        println!("step {}: {:?}", step + 1, symbol as char);
        println!("{}\n", tree);
    }
}

fn run_codes(symbols: &str) {
    let mut tree = AdaptiveTree::new();
    for &symbol in symbols.as_bytes() {
        tree.observe(symbol);
    }

    let mut known: Vec<u8> = symbols.as_bytes().to_vec();
    known.sort_unstable();
    known.dedup();
    for symbol in known {
        if let Some(code) = tree.code_for(symbol) {
            println!("{:?}\t{}\t{}", symbol as char, format_code(&code), weight_of(&tree, symbol));
        }
    }
    println!("NYT\t{}", format_code(&tree.nyt_code()));
}

fn weight_of(tree: &AdaptiveTree, symbol: u8) -> u64 {
    tree.leaf(symbol).map_or(0, |leaf| tree.node(leaf).weight())
}

fn format_code(code: &[bool]) -> String {
    if code.is_empty() {
        return "-".to_string();
    }
    code.iter().map(|&bit| if bit { '1' } else { '0' }).collect()
}
