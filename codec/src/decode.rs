//! Pixel-to-payload decoding.
//!
//! Decoding works on the flat sequence of channel values read back from a
//! container row (`r, g, b, r, g, b, ...`). Two behaviours are kept bit-exact
//! with containers produced by earlier releases:
//!
//! - At 1 bit per pixel only the red channel of each pixel is sampled.
//! - At `3k` bits per pixel, values are processed in blocks of `8 * bits`
//!   values, and a byte completed while still on the first value of a block is
//!   not emitted (its bits stay in the accumulator). Leftover bits at the end
//!   of a block are dropped.

use crate::error::CodecResult;
use crate::mode::BitsPerPixel;
use crate::pixel::Pixel;

/// Decodes channel values written at `mode` back into payload bytes.
///
/// # Example
///
/// ```
/// use codec::{decode_payload, BitsPerPixel};
///
/// let mode = BitsPerPixel::new(12).unwrap();
/// let channels = [0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233];
/// assert_eq!(decode_payload(&channels, mode), vec![1, 2, 5, 13, 18, 57, 153]);
/// ```
#[must_use]
pub fn decode_payload(channels: &[u8], mode: BitsPerPixel) -> Vec<u8> {
    if mode == BitsPerPixel::TRUE_COLOR {
        return channels.to_vec();
    }
    if mode.is_monochrome() {
        return decode_monochrome(channels);
    }

    let bits = mode.bits_per_channel();
    let block_len = mode.get() as usize * 8;
    let mut out = Vec::with_capacity(channels.len() * bits / 8 + 1);
    for block in channels.chunks(block_len) {
        decode_block(block, bits, &mut out);
    }
    out
}

/// Decodes channel values for a raw bits-per-pixel value.
///
/// Fails with [`CodecError::UnsupportedBitsPerPixel`](crate::CodecError::UnsupportedBitsPerPixel)
/// when `bits` is not a supported density.
pub fn decode_channels(channels: &[u8], bits: u32) -> CodecResult<Vec<u8>> {
    let mode = BitsPerPixel::new(bits)?;
    Ok(decode_payload(channels, mode))
}

/// Decodes whole pixels written at `mode`.
#[must_use]
pub fn decode_pixels(pixels: &[Pixel], mode: BitsPerPixel) -> Vec<u8> {
    let channels: Vec<u8> = pixels.iter().flat_map(|pixel| pixel.channels()).collect();
    decode_payload(&channels, mode)
}

fn decode_monochrome(channels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(channels.len() / 24 + 1);
    let mut current = 0u8;
    for (sample, &red) in channels.iter().step_by(3).enumerate() {
        if sample % 8 == 0 && sample != 0 {
            out.push(current);
            current = 0;
        }
        if red != 0 {
            current |= 0x80 >> (sample % 8);
        }
    }
    if current != 0 {
        out.push(current);
    }
    out
}

fn decode_block(block: &[u8], bits: usize, out: &mut Vec<u8>) {
    let mut current = 0u8;
    let mut shift = 0usize;
    for (index, &value) in block.iter().enumerate() {
        for _ in 0..bits {
            current |= value & (0x80 >> (shift % 8));
            shift += 1;
            if shift % 8 == 0 && index != 0 {
                out.push(current);
                current = 0;
            }
        }
    }
}
