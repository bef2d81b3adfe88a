//! Bits-per-pixel density.

use std::fmt;

use crate::error::{CodecError, CodecResult};

/// Number of payload bits mapped onto one pixel.
///
/// Valid values are 1 (black/white) and every multiple of 3 up to 24. For a
/// multiple of 3 each of the three colour channels carries `bits / 3` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitsPerPixel(u8);

impl BitsPerPixel {
    /// One bit per pixel, rendered black or white.
    pub const MONOCHROME: Self = Self(1);

    /// Three full bytes per pixel.
    pub const TRUE_COLOR: Self = Self(24);

    /// Every supported density, ascending.
    pub const SUPPORTED: [u32; 9] = [1, 3, 6, 9, 12, 15, 18, 21, 24];

    /// Validates a raw bits-per-pixel value.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(bits: u32) -> CodecResult<Self> {
        match bits {
            1 | 3 | 6 | 9 | 12 | 15 | 18 | 21 | 24 => Ok(Self(bits as u8)),
            _ => Err(CodecError::UnsupportedBitsPerPixel { bits }),
        }
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0 as u32
    }

    /// Returns `true` for the 1-bit black/white density.
    #[must_use]
    pub const fn is_monochrome(self) -> bool {
        self.0 == 1
    }

    /// Payload bits carried by each colour channel (0 for monochrome).
    #[must_use]
    pub const fn bits_per_channel(self) -> usize {
        (self.0 / 3) as usize
    }

    /// Number of pixels needed to encode a payload of `len` bytes.
    #[must_use]
    pub const fn pixels_for(self, len: usize) -> usize {
        let bits = len.saturating_mul(8);
        bits.div_ceil(self.0 as usize)
    }
}

impl Default for BitsPerPixel {
    fn default() -> Self {
        Self::TRUE_COLOR
    }
}

impl TryFrom<u32> for BitsPerPixel {
    type Error = CodecError;

    fn try_from(bits: u32) -> CodecResult<Self> {
        Self::new(bits)
    }
}

impl From<BitsPerPixel> for u32 {
    fn from(bits: BitsPerPixel) -> Self {
        bits.get()
    }
}

impl fmt::Display for BitsPerPixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_values() {
        for bits in BitsPerPixel::SUPPORTED {
            let mode = BitsPerPixel::new(bits).unwrap();
            assert_eq!(mode.get(), bits);
        }
    }

    #[test]
    fn rejects_unsupported_values() {
        for bits in [0, 2, 4, 5, 7, 8, 16, 25, 26, 27, 30, u32::MAX] {
            assert_eq!(
                BitsPerPixel::new(bits),
                Err(CodecError::UnsupportedBitsPerPixel { bits }),
                "{bits} should be rejected"
            );
        }
    }

    #[test]
    fn bits_per_channel() {
        assert_eq!(BitsPerPixel::MONOCHROME.bits_per_channel(), 0);
        assert_eq!(BitsPerPixel::new(3).unwrap().bits_per_channel(), 1);
        assert_eq!(BitsPerPixel::new(12).unwrap().bits_per_channel(), 4);
        assert_eq!(BitsPerPixel::TRUE_COLOR.bits_per_channel(), 8);
    }

    #[test]
    fn pixels_for_payload() {
        assert_eq!(BitsPerPixel::MONOCHROME.pixels_for(2), 16);
        assert_eq!(BitsPerPixel::TRUE_COLOR.pixels_for(5), 2);
        assert_eq!(BitsPerPixel::new(9).unwrap().pixels_for(2), 2);
        assert_eq!(BitsPerPixel::new(3).unwrap().pixels_for(0), 0);
    }

    #[test]
    fn try_from_and_into() {
        let mode: BitsPerPixel = 6u32.try_into().unwrap();
        let raw: u32 = mode.into();
        assert_eq!(raw, 6);
        assert!(BitsPerPixel::try_from(2u32).is_err());
    }

    #[test]
    fn default_is_true_color() {
        assert_eq!(BitsPerPixel::default(), BitsPerPixel::TRUE_COLOR);
        assert_eq!(BitsPerPixel::default().to_string(), "24");
    }
}
