//! 24-bit ANSI terminal rendering.
//!
//! Two packets share one terminal line: the upper half-block glyph takes the
//! top packet's pixel as foreground and the bottom packet's pixel as
//! background. Missing pixels are black.

use std::fmt::Write;

use codec::{encode_payload, BitsPerPixel, Pixel};

const UPPER_HALF_BLOCK: char = '\u{2580}';
const RESET: &str = "\x1B[m";

/// Renders one terminal line for `top` and an optional `bottom` packet.
///
/// The line is as wide as the longer packet, capped at `x_limit` pixels
/// (`0` means uncapped), and ends with an attribute reset.
#[must_use]
pub fn render_pair(top: &[u8], bottom: Option<&[u8]>, mode: BitsPerPixel, x_limit: u32) -> String {
    let mut upper = encode_payload(top, mode);
    let mut lower = encode_payload(bottom.unwrap_or_default(), mode);
    let width = upper.len().max(lower.len());
    let width = if x_limit == 0 {
        width
    } else {
        width.min(x_limit as usize)
    };

    let mut line = String::with_capacity(width * 40 + RESET.len() + 1);
    for _ in 0..width {
        let fg = upper.next().unwrap_or(Pixel::BLACK);
        let bg = lower.next().unwrap_or(Pixel::BLACK);
        // Writing into a String cannot fail.
        let _ = write!(
            line,
            "\x1B[38;2;{};{};{}m\x1B[48;2;{};{};{}m{UPPER_HALF_BLOCK}",
            fg.r, fg.g, fg.b, bg.r, bg.g, bg.b
        );
    }
    line.push_str(RESET);
    line
}
