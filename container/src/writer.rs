//! Container text writer, the structural inverse of the parser.

use std::fmt::{self, Write};

use codec::PlacedPixel;

use crate::body::BODY_TERMINATOR;
use crate::header::{ContainerHeader, Dimensions};
use crate::parser::{COMMENT_CLOSE, COMMENT_OPEN};

/// Name written in front of the version string.
pub const TOOL_NAME: &str = "netviz";

const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>";

/// Writes the XML declaration, dimensions and metadata comment.
///
/// Every field of the header's version is written, in table order. Double
/// quotes inside quoted values are replaced by single quotes.
pub fn write_header<W: Write>(out: &mut W, header: &ContainerHeader) -> fmt::Result {
    let Dimensions { width, height } = header.dimensions;
    writeln!(out, "{XML_DECLARATION}")?;
    writeln!(out, "<svg width=\"{width}\" height=\"{height}\">")?;
    writeln!(out, "{COMMENT_OPEN}")?;
    writeln!(out, "\t{TOOL_NAME} \"{}\"", header.version)?;
    for field in header.version.fields() {
        let value = header.field_value(field);
        if field.is_quoted() {
            writeln!(out, "\t{}=\"{}\"", field.key(), value.replace('"', "'"))?;
        } else {
            writeln!(out, "\t{}={value}", field.key())?;
        }
    }
    writeln!(out, "{COMMENT_CLOSE}")
}

/// Writes one pixel declaration with its coordinates multiplied by `scale`.
pub fn write_pixel<W: Write>(out: &mut W, placed: &PlacedPixel, scale: u32) -> fmt::Result {
    let x = placed.x.saturating_mul(scale);
    let y = placed.y.saturating_mul(scale);
    let [r, g, b] = placed.pixel.channels();
    writeln!(
        out,
        "<rect x=\"{x}\" y=\"{y}\" width=\"{scale}\" height=\"{scale}\" style=\"fill:rgb({r},{g},{b})\" />"
    )
}

/// Writes the body terminator.
pub fn write_footer<W: Write>(out: &mut W) -> fmt::Result {
    writeln!(out, "{BODY_TERMINATOR}")
}
