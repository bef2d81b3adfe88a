//! Row placement (packet → pixel row) and row reassembly (pixel rows → packets).

use crate::decode::decode_payload;
use crate::error::{CodecError, CodecResult};
use crate::mode::BitsPerPixel;
use crate::pixel::{Pixel, PixelEncoder};

/// A pixel tagged with its grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacedPixel {
    pub x: u32,
    pub y: u32,
    pub pixel: Pixel,
}

impl PlacedPixel {
    #[must_use]
    pub const fn new(x: u32, y: u32, pixel: Pixel) -> Self {
        Self { x, y, pixel }
    }
}

/// Chooses the row a packet is drawn on.
pub trait RowIndex {
    /// Returns the row for a packet captured at `timestamp_micros`.
    fn row_for(&mut self, timestamp_micros: i64) -> u32;
}

/// One row per packet, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct FixedRows {
    next: u32,
}

impl FixedRows {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }
}

impl RowIndex for FixedRows {
    fn row_for(&mut self, _timestamp_micros: i64) -> u32 {
        let row = self.next;
        self.next = self.next.saturating_add(1);
        row
    }
}

/// Rows are microseconds elapsed since the first packet seen.
///
/// Packets sharing a microsecond share a row.
#[derive(Debug, Clone, Default)]
pub struct TimeSlicedRows {
    origin: Option<i64>,
}

impl TimeSlicedRows {
    #[must_use]
    pub const fn new() -> Self {
        Self { origin: None }
    }
}

impl RowIndex for TimeSlicedRows {
    fn row_for(&mut self, timestamp_micros: i64) -> u32 {
        let origin = *self.origin.get_or_insert(timestamp_micros);
        let elapsed = timestamp_micros.saturating_sub(origin).max(0);
        u32::try_from(elapsed).unwrap_or(u32::MAX)
    }
}

/// Pixels of one packet laid out along a row.
///
/// Created by [`place_row`].
#[derive(Debug, Clone)]
pub struct PacketRow<'a> {
    encoder: PixelEncoder<'a>,
    y: u32,
    x: u32,
    x_limit: u32,
}

impl Iterator for PacketRow<'_> {
    type Item = PlacedPixel;

    fn next(&mut self) -> Option<PlacedPixel> {
        if self.x_limit != 0 && self.x >= self.x_limit {
            return None;
        }
        let pixel = self.encoder.next()?;
        let placed = PlacedPixel::new(self.x, self.y, pixel);
        self.x += 1;
        Some(placed)
    }
}

/// Lays `payload` out on row `y`, at most `x_limit` pixels wide
/// (`0` means unbounded).
#[must_use]
pub const fn place_row(payload: &[u8], y: u32, mode: BitsPerPixel, x_limit: u32) -> PacketRow<'_> {
    PacketRow {
        encoder: PixelEncoder::new(payload, mode),
        y,
        x: 0,
        x_limit,
    }
}

/// Rebuilds packets from pixel declarations read in row order.
///
/// Pixels are accumulated until the y-coordinate changes; the finished row is
/// then decoded and returned. Any x-coordinate at or beyond the limit is an
/// error and the reassembler should not be fed further.
#[derive(Debug, Clone)]
pub struct RowReassembler {
    mode: BitsPerPixel,
    x_limit: u32,
    row: Option<u32>,
    channels: Vec<u8>,
}

impl RowReassembler {
    /// Creates a reassembler for rows at most `x_limit` wide.
    #[must_use]
    pub const fn new(mode: BitsPerPixel, x_limit: u32) -> Self {
        Self {
            mode,
            x_limit,
            row: None,
            channels: Vec::new(),
        }
    }

    /// Returns the row currently being accumulated.
    #[must_use]
    pub const fn current_row(&self) -> Option<u32> {
        self.row
    }

    /// Feeds one pixel. Returns the decoded packet of the previous row when
    /// this pixel starts a new one.
    pub fn push(&mut self, placed: PlacedPixel) -> CodecResult<Option<Vec<u8>>> {
        if placed.x >= self.x_limit {
            return Err(CodecError::OutOfBounds {
                x: placed.x,
                limit: self.x_limit,
            });
        }

        let completed = match self.row {
            Some(row) if row != placed.y => self.take_row(),
            _ => None,
        };
        self.row = Some(placed.y);
        self.channels.extend_from_slice(&placed.pixel.channels());
        Ok(completed)
    }

    /// Flushes the pending row, if it holds any pixels.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let packet = self.take_row();
        self.row = None;
        packet
    }

    fn take_row(&mut self) -> Option<Vec<u8>> {
        if self.channels.is_empty() {
            return None;
        }
        let packet = decode_payload(&self.channels, self.mode);
        self.channels.clear();
        Some(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(x: u32, y: u32) -> PlacedPixel {
        PlacedPixel::new(x, y, Pixel::WHITE)
    }

    #[test]
    fn fixed_rows_count_packets() {
        let mut rows = FixedRows::new();
        assert_eq!(rows.row_for(500), 0);
        assert_eq!(rows.row_for(100), 1);
        assert_eq!(rows.row_for(100), 2);
    }

    #[test]
    fn time_sliced_rows_use_elapsed_micros() {
        let mut rows = TimeSlicedRows::new();
        assert_eq!(rows.row_for(1_000), 0);
        assert_eq!(rows.row_for(1_007), 7);
        assert_eq!(rows.row_for(1_007), 7);
        // Out-of-order timestamps clamp to the first row.
        assert_eq!(rows.row_for(900), 0);
    }

    #[test]
    fn place_row_assigns_coordinates() {
        let placed: Vec<PlacedPixel> =
            place_row(&[1, 2, 3, 4, 5, 6], 3, BitsPerPixel::TRUE_COLOR, 0).collect();
        assert_eq!(
            placed,
            vec![
                PlacedPixel::new(0, 3, Pixel::new(1, 2, 3)),
                PlacedPixel::new(1, 3, Pixel::new(4, 5, 6)),
            ]
        );
    }

    #[test]
    fn place_row_respects_x_limit() {
        let placed: Vec<PlacedPixel> =
            place_row(&[0xFF; 4], 0, BitsPerPixel::MONOCHROME, 5).collect();
        assert_eq!(placed.len(), 5);
        assert_eq!(placed.last().unwrap().x, 4);
    }

    #[test]
    fn reassembler_flushes_on_row_change() {
        let mut rows = RowReassembler::new(BitsPerPixel::TRUE_COLOR, 10);
        assert_eq!(
            rows.push(PlacedPixel::new(0, 0, Pixel::new(1, 2, 3))).unwrap(),
            None
        );
        assert_eq!(
            rows.push(PlacedPixel::new(1, 0, Pixel::new(4, 5, 6))).unwrap(),
            None
        );
        assert_eq!(
            rows.push(PlacedPixel::new(0, 1, Pixel::new(7, 8, 9))).unwrap(),
            Some(vec![1, 2, 3, 4, 5, 6])
        );
        assert_eq!(rows.current_row(), Some(1));
        assert_eq!(rows.finish(), Some(vec![7, 8, 9]));
        assert_eq!(rows.finish(), None);
    }

    #[test]
    fn reassembler_first_row_need_not_be_zero() {
        let mut rows = RowReassembler::new(BitsPerPixel::TRUE_COLOR, 10);
        assert_eq!(rows.push(white(0, 4)).unwrap(), None);
        assert_eq!(rows.finish(), Some(vec![255, 255, 255]));
    }

    #[test]
    fn reassembler_rejects_out_of_bounds_before_flushing() {
        let mut rows = RowReassembler::new(BitsPerPixel::TRUE_COLOR, 2);
        rows.push(white(0, 0)).unwrap();
        rows.push(white(1, 0)).unwrap();
        assert_eq!(
            rows.push(white(2, 1)),
            Err(CodecError::OutOfBounds { x: 2, limit: 2 })
        );
        assert_eq!(rows.current_row(), Some(0));
    }

    #[test]
    fn reassembler_decodes_with_mode() {
        let mut rows = RowReassembler::new(BitsPerPixel::MONOCHROME, 16);
        for x in 0..8 {
            let pixel = if x == 7 { Pixel::WHITE } else { Pixel::BLACK };
            rows.push(PlacedPixel::new(x, 0, pixel)).unwrap();
        }
        assert_eq!(rows.finish(), Some(vec![0x01]));
    }

    #[test]
    fn empty_reassembler_finishes_empty() {
        let mut rows = RowReassembler::new(BitsPerPixel::TRUE_COLOR, 1);
        assert_eq!(rows.finish(), None);
    }
}
