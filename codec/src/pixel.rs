//! Pixel type and the payload-to-pixel encoder.

use bitstream::BitCursor;

use crate::mode::BitsPerPixel;

/// An RGB pixel.
///
/// For multi-bit densities each channel holds payload bits masked in place,
/// not a right-aligned value: a 4-bit channel taken from the low nibble of a
/// byte stays in `0x0F`, one taken from the high nibble stays in `0xF0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a pixel from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns the channels in `r, g, b` order.
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Pixel {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Lazily encodes a payload into pixels at a fixed density.
///
/// Created by [`encode_payload`]. Yields pixels until the payload is consumed;
/// the last pixel may be only partially filled and is still yielded. An empty
/// payload yields nothing.
#[derive(Debug, Clone)]
pub struct PixelEncoder<'a> {
    payload: &'a [u8],
    mode: BitsPerPixel,
    cursor: BitCursor,
}

impl<'a> PixelEncoder<'a> {
    /// Creates an encoder positioned at the start of `payload`.
    #[must_use]
    pub const fn new(payload: &'a [u8], mode: BitsPerPixel) -> Self {
        Self {
            payload,
            mode,
            cursor: BitCursor::new(),
        }
    }

    /// Encodes the next pixel along with the number of channels that received
    /// at least one payload bit.
    fn next_filled(&mut self) -> Option<(Pixel, usize)> {
        if self.cursor.is_at_end(self.payload.len()) {
            return None;
        }

        if self.mode.is_monochrome() {
            let set = self.cursor.bit_is_set(self.payload)?;
            self.cursor.advance(1);
            let pixel = if set { Pixel::WHITE } else { Pixel::BLACK };
            return Some((pixel, 3));
        }

        let bits = self.mode.bits_per_channel();
        let mut channels = [0u8; 3];
        let mut filled = 0;
        for channel in &mut channels {
            if self.cursor.is_at_end(self.payload.len()) {
                break;
            }
            *channel = gather_bits(self.payload, &mut self.cursor, bits);
            filled += 1;
        }
        Some((Pixel::from(channels), filled))
    }
}

impl Iterator for PixelEncoder<'_> {
    type Item = Pixel;

    fn next(&mut self) -> Option<Pixel> {
        self.next_filled().map(|(pixel, _)| pixel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cursor.bits_remaining(self.payload.len());
        let bits = self.mode.get() as usize;
        let pixels = remaining.div_ceil(bits);
        (pixels, Some(pixels))
    }
}

impl ExactSizeIterator for PixelEncoder<'_> {}

/// ORs up to `count` consecutive payload bits into one byte, leaving every bit
/// at its native position. Stops early at the end of the payload.
fn gather_bits(payload: &[u8], cursor: &mut BitCursor, count: usize) -> u8 {
    let mut value = 0u8;
    for _ in 0..count {
        let Some(bit) = cursor.masked_bit(payload) else {
            break;
        };
        value |= bit;
        cursor.advance(1);
    }
    value
}

/// Encodes `payload` into pixels at `mode`.
///
/// # Example
///
/// ```
/// use codec::{encode_payload, BitsPerPixel, Pixel};
///
/// let pixels: Vec<Pixel> = encode_payload(&[0x41, 0x69, 0xE1], BitsPerPixel::TRUE_COLOR).collect();
/// assert_eq!(pixels, vec![Pixel::new(0x41, 0x69, 0xE1)]);
/// ```
#[must_use]
pub const fn encode_payload(payload: &[u8], mode: BitsPerPixel) -> PixelEncoder<'_> {
    PixelEncoder::new(payload, mode)
}

/// Encodes `payload` and flattens the result into the channel values that
/// actually carried payload bits.
///
/// Channels of a trailing pixel that the payload did not reach are omitted, so
/// at 24 bits per pixel the output equals the payload.
#[must_use]
pub fn channel_values(payload: &[u8], mode: BitsPerPixel) -> Vec<u8> {
    let mut encoder = PixelEncoder::new(payload, mode);
    let mut out = Vec::with_capacity(mode.pixels_for(payload.len()) * 3);
    while let Some((pixel, filled)) = encoder.next_filled() {
        out.extend_from_slice(&pixel.channels()[..filled]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(bits: u32) -> BitsPerPixel {
        BitsPerPixel::new(bits).unwrap()
    }

    #[test]
    fn gather_bits_keeps_native_positions() {
        let payload = [0xFF; 5];
        let cases = [(8, 0xFF), (4, 0xF0), (3, 0xE0), (1, 0x80)];
        for (count, expected) in cases {
            let mut cursor = BitCursor::new();
            assert_eq!(gather_bits(&payload, &mut cursor, count), expected);
            assert_eq!(cursor.bit_position(), count);
        }
    }

    #[test]
    fn gather_bits_stops_at_end() {
        let payload = [0x0F];
        let mut cursor = BitCursor::at(0, 6);
        assert_eq!(gather_bits(&payload, &mut cursor, 5), 0x03);
        assert!(cursor.is_at_end(1));
        assert_eq!(gather_bits(&payload, &mut cursor, 5), 0);
    }

    #[test]
    fn monochrome_pixels() {
        let pixels: Vec<Pixel> = encode_payload(&[0xFF, 0x00], BitsPerPixel::MONOCHROME).collect();
        assert_eq!(pixels.len(), 16);
        assert!(pixels[..8].iter().all(|p| *p == Pixel::WHITE));
        assert!(pixels[8..].iter().all(|p| *p == Pixel::BLACK));
    }

    #[test]
    fn true_color_takes_three_bytes() {
        let pixels: Vec<Pixel> =
            encode_payload(&[0x41, 0x69, 0xE1, 0x41, 0x69, 0xE1], mode(24)).collect();
        assert_eq!(pixels, vec![Pixel::new(65, 105, 225); 2]);
    }

    #[test]
    fn true_color_partial_last_pixel() {
        let pixels: Vec<Pixel> = encode_payload(&[1, 2, 3, 4, 5], mode(24)).collect();
        assert_eq!(pixels, vec![Pixel::new(1, 2, 3), Pixel::new(4, 5, 0)]);
    }

    #[test]
    fn twelve_bits_split_nibbles() {
        let pixels: Vec<Pixel> = encode_payload(&[0xAB, 0xCD], mode(12)).collect();
        assert_eq!(
            pixels,
            vec![Pixel::new(0xA0, 0x0B, 0xC0), Pixel::new(0x0D, 0, 0)]
        );
    }

    #[test]
    fn nine_bits_cross_byte_boundary() {
        // 0b1011_0110 0b1100_0000: the blue channel of the first pixel mixes
        // the tail of byte 0 with the head of byte 1.
        let pixels: Vec<Pixel> = encode_payload(&[0xB6, 0xC0], mode(9)).collect();
        assert_eq!(
            pixels,
            vec![Pixel::new(0xA0, 0x14, 0x82), Pixel::new(0x40, 0x00, 0x00)]
        );
    }

    #[test]
    fn empty_payload_yields_nothing() {
        for bits in BitsPerPixel::SUPPORTED {
            assert_eq!(encode_payload(&[], mode(bits)).count(), 0);
        }
    }

    #[test]
    fn size_hint_matches_count() {
        let payload = [0x5A; 7];
        for bits in BitsPerPixel::SUPPORTED {
            let encoder = encode_payload(&payload, mode(bits));
            let hint = encoder.len();
            assert_eq!(hint, encoder.count(), "mode {bits}");
            assert_eq!(hint, mode(bits).pixels_for(payload.len()));
        }
    }

    #[test]
    fn channel_values_true_color_is_identity() {
        assert_eq!(channel_values(&[1, 2, 3, 4, 5], mode(24)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn channel_values_omit_unreached_channels() {
        assert_eq!(channel_values(&[0xAB], mode(12)), vec![0xA0, 0x0B]);
        assert_eq!(channel_values(&[0x80], mode(1)).len(), 24);
    }
}
