//! Binary greyscale image container (PGM `P5`)
//!
//! Layout: `P5\n<width> <height>\n255\n` followed by one byte per pixel,
//! row-major, no padding.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::IoError;

/// Highest grey level written to the header.
pub const MAX_GREY: u8 = 255;

const MAGIC: &[u8; 2] = b"P5";

/// Errors raised while building, reading or writing an image.
#[derive(Debug, Error)]
pub enum PgmError {
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Pixel buffer length does not match the dimensions.
    #[error("{width}x{height} image needs {expected} pixels, got {actual}")]
    SizeMismatch {
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
        /// `width * height`.
        expected: usize,
        /// Pixels supplied.
        actual: usize,
    },

    /// Header could not be parsed.
    #[error("malformed PGM header: {0}")]
    MalformedHeader(&'static str),

    /// `width * height` does not fit in `usize`.
    #[error("{width}x{height} image is too large to address")]
    TooLarge {
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

impl ImageShape {
    /// Largest square whose area does not exceed `pixel_count`.
    pub fn square_for(pixel_count: usize) -> Self {
        let side = integer_sqrt(pixel_count);
        Self {
            width: side,
            height: side,
        }
    }

    /// `width * height`, saturating at `usize::MAX`.
    pub fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// `width * height`, or `None` if the product overflows.
    pub fn checked_pixel_count(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }
}

/// Floor of the square root.
fn integer_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root.checked_mul(root).map_or(true, |square| square > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).is_some_and(|square| square <= n) {
        root += 1;
    }
    root
}

/// Greyscale image with 8-bit pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgmImage {
    shape: ImageShape,
    pixels: Vec<u8>,
}

impl PgmImage {
    /// Wrap a pixel buffer; its length must equal `width * height`.
    pub fn new(shape: ImageShape, pixels: Vec<u8>) -> Result<Self, PgmError> {
        let expected = shape.checked_pixel_count().ok_or(PgmError::TooLarge {
            width: shape.width,
            height: shape.height,
        })?;
        if pixels.len() != expected {
            return Err(PgmError::SizeMismatch {
                width: shape.width,
                height: shape.height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { shape, pixels })
    }

    /// Dimensions.
    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    /// Raw pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Header text.
    pub fn header(&self) -> String {
        format!(
            "P5\n{} {}\n{}\n",
            self.shape.width, self.shape.height, MAX_GREY
        )
    }

    /// Serialize header and pixels.
    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        out.write_all(self.header().as_bytes())?;
        out.write_all(&self.pixels)?;
        out.flush()
    }

    /// Write the image to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| IoError::new(path, source))?;
        self.write_to(BufWriter::new(file))
            .map_err(|source| IoError::new(path, source))
    }

    /// Parse a `P5` image with 8-bit samples. Header lines starting with
    /// `#` are skipped.
    pub fn parse(bytes: &[u8]) -> Result<Self, PgmError> {
        let mut cursor = 0;
        let mut fields: Vec<&[u8]> = Vec::with_capacity(4);

        while fields.len() < 4 {
            let rest = &bytes[cursor..];
            let line_len = rest
                .iter()
                .position(|&b| b == b'\n')
                .ok_or(PgmError::MalformedHeader("unexpected end of header"))?;
            let line = &rest[..line_len];
            cursor += line_len + 1;
            if line.first() == Some(&b'#') {
                continue;
            }
            fields.extend(line.split(|b| b.is_ascii_whitespace()).filter(|f| !f.is_empty()));
        }

        if fields.len() != 4 || fields[0] != MAGIC {
            return Err(PgmError::MalformedHeader("expected P5 <width> <height> <max>"));
        }
        let width = parse_number(fields[1])?;
        let height = parse_number(fields[2])?;
        if parse_number(fields[3])? != usize::from(MAX_GREY) {
            return Err(PgmError::MalformedHeader("only 8-bit images are supported"));
        }

        Self::new(ImageShape { width, height }, bytes[cursor..].to_vec())
    }
}

fn parse_number(field: &[u8]) -> Result<usize, PgmError> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or(PgmError::MalformedHeader("dimension is not a number"))
}

/// Write decoded pixels as a PGM file.
pub fn write_image<P: AsRef<Path>>(
    pixels: Vec<u8>,
    width: usize,
    height: usize,
    path: P,
) -> Result<(), PgmError> {
    let image = PgmImage::new(ImageShape { width, height }, pixels)?;
    image.save(path)?;
    Ok(())
}
