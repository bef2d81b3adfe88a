//! Explicit (byte, bit) position within a payload buffer.

/// A read position inside a byte buffer, tracked as a byte index plus a bit
/// index within that byte.
///
/// Bits are addressed MSB-first: bit index 0 is `0x80`, bit index 7 is `0x01`.
/// The bit index is always kept in `0..8`; advancing past the last bit of a
/// byte carries into the byte index.
///
/// The cursor owns no data. Callers pass the buffer to each query, so one
/// cursor value can be threaded through several helper functions by `&mut`
/// without any shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitCursor {
    byte: usize,
    bit: u8,
}

impl BitCursor {
    /// Creates a cursor at the first bit of a buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { byte: 0, bit: 0 }
    }

    /// Creates a cursor at an arbitrary position.
    ///
    /// A `bit` of 8 or more is carried into the byte index.
    #[must_use]
    pub fn at(byte: usize, bit: usize) -> Self {
        let mut cursor = Self { byte, bit: 0 };
        cursor.advance(bit);
        cursor
    }

    /// Returns the byte index.
    #[must_use]
    pub const fn byte_index(self) -> usize {
        self.byte
    }

    /// Returns the bit index within the current byte (always `< 8`).
    #[must_use]
    pub const fn bit_index(self) -> u8 {
        self.bit
    }

    /// Returns the absolute bit offset from the start of the buffer.
    #[must_use]
    pub const fn bit_position(self) -> usize {
        self.byte.saturating_mul(8).saturating_add(self.bit as usize)
    }

    /// Moves the cursor forward by `bits`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&mut self, bits: usize) {
        let bit = usize::from(self.bit) + bits % 8;
        self.byte = self
            .byte
            .saturating_add(bits / 8)
            .saturating_add(bit / 8);
        // bit % 8 is always in 0..8
        self.bit = (bit % 8) as u8;
    }

    /// Returns `true` once the cursor has consumed a buffer of `len` bytes.
    #[must_use]
    pub const fn is_at_end(self, len: usize) -> bool {
        self.byte >= len
    }

    /// Returns the number of bits left in a buffer of `len` bytes.
    #[must_use]
    pub const fn bits_remaining(self, len: usize) -> usize {
        len.saturating_mul(8).saturating_sub(self.bit_position())
    }

    /// Returns the mask selecting the bit under the cursor.
    #[must_use]
    pub const fn mask(self) -> u8 {
        0x80 >> self.bit
    }

    /// Returns the byte under the cursor with every bit cleared except the one
    /// the cursor points at. The surviving bit keeps its native position.
    ///
    /// Returns `None` when the cursor is at or past the end of `data`.
    #[must_use]
    pub fn masked_bit(self, data: &[u8]) -> Option<u8> {
        data.get(self.byte).map(|byte| byte & self.mask())
    }

    /// Returns whether the bit under the cursor is set, or `None` at the end.
    #[must_use]
    pub fn bit_is_set(self, data: &[u8]) -> Option<bool> {
        self.masked_bit(data).map(|bit| bit != 0)
    }
}
