//! Pixel declaration lines and body decoding.

use codec::{Pixel, PlacedPixel, RowReassembler};

use crate::error::ContainerResult;
use crate::header::ContainerHeader;
use crate::parser::parse_digits;

/// Closes the container.
pub const BODY_TERMINATOR: &str = "</svg>";

/// Classification of one body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLine {
    /// A pixel declaration, with coordinates as written (scaled).
    Pixel(PlacedPixel),
    Terminator,
    /// Anything else; ignored.
    Other,
}

/// Classifies a body line.
#[must_use]
pub fn parse_body_line(line: &str) -> BodyLine {
    if let Some(placed) = match_pixel(line) {
        BodyLine::Pixel(placed)
    } else if line.contains(BODY_TERMINATOR) {
        BodyLine::Terminator
    } else {
        BodyLine::Other
    }
}

/// Matches
/// `<rect x="X" y="Y" width="S" height="S" style="fill:rgb(R,G,B)" />`.
fn match_pixel(line: &str) -> Option<PlacedPixel> {
    let rest = line.trim().strip_prefix("<rect x=\"")?;
    let (x, rest) = rest.split_once('"')?;
    let rest = rest.strip_prefix(" y=\"")?;
    let (y, rest) = rest.split_once('"')?;
    let rest = rest.strip_prefix(" width=\"")?;
    let (width, rest) = rest.split_once('"')?;
    let rest = rest.strip_prefix(" height=\"")?;
    let (height, rest) = rest.split_once('"')?;
    parse_digits(width)?;
    parse_digits(height)?;
    let rgb = rest
        .strip_prefix(" style=\"fill:rgb(")?
        .strip_suffix(")\" />")?;

    let mut channels = rgb
        .splitn(3, ',')
        .map(|c| parse_digits(c).and_then(|v| u8::try_from(v).ok()));
    let r = channels.next()??;
    let g = channels.next()??;
    let b = channels.next()??;

    Some(PlacedPixel::new(
        parse_digits(x)?,
        parse_digits(y)?,
        Pixel::new(r, g, b),
    ))
}

/// Turns body lines back into packets.
///
/// Rows are bounded by the declared image width and decoded at the header's
/// density. Decoding stops at the body terminator.
#[derive(Debug, Clone)]
pub struct BodyDecoder {
    rows: RowReassembler,
    finished: bool,
}

impl BodyDecoder {
    #[must_use]
    pub const fn new(header: &ContainerHeader) -> Self {
        Self {
            rows: RowReassembler::new(header.bits_per_pixel, header.dimensions.width),
            finished: false,
        }
    }

    /// Returns `true` once the terminator has been seen.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feeds one body line. Returns a packet when a row completes.
    pub fn feed(&mut self, line: &str) -> ContainerResult<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }
        match parse_body_line(line) {
            BodyLine::Pixel(placed) => Ok(self.rows.push(placed)?),
            BodyLine::Terminator => Ok(self.finish()),
            BodyLine::Other => Ok(None),
        }
    }

    /// Flushes the pending row. Also called at end of input when the
    /// terminator is missing.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        self.finished = true;
        self.rows.finish()
    }
}
