//! In-memory assembly of one container image.

use std::fmt;

use codec::{place_row, PlacedPixel};

use crate::header::{ContainerHeader, Dimensions};
use crate::writer::{write_footer, write_header, write_pixel};

/// Pixels of one image, collected packet by packet.
///
/// Dimensions are derived from the pixels: the widest row times the scale,
/// and the last row plus one times the scale.
#[derive(Debug, Clone)]
pub struct ContainerImage {
    header: ContainerHeader,
    pixels: Vec<PlacedPixel>,
    widest: u32,
    last_row: Option<u32>,
    packets: usize,
}

impl ContainerImage {
    /// Starts an empty image. The header's dimensions are recomputed on render.
    #[must_use]
    pub const fn new(header: ContainerHeader) -> Self {
        Self {
            header,
            pixels: Vec::new(),
            widest: 0,
            last_row: None,
            packets: 0,
        }
    }

    /// Lays `payload` out on row `y`, at most `x_limit` pixels wide
    /// (`0` means unbounded). Returns the number of pixels added.
    pub fn add_packet(&mut self, payload: &[u8], y: u32, x_limit: u32) -> usize {
        let before = self.pixels.len();
        for placed in place_row(payload, y, self.header.bits_per_pixel, x_limit) {
            self.widest = self.widest.max(placed.x.saturating_add(1));
            self.pixels.push(placed);
        }
        self.last_row = Some(self.last_row.map_or(y, |row| row.max(y)));
        self.packets += 1;
        self.pixels.len() - before
    }

    #[must_use]
    pub const fn header(&self) -> &ContainerHeader {
        &self.header
    }

    #[must_use]
    pub fn pixels(&self) -> &[PlacedPixel] {
        &self.pixels
    }

    /// Number of packets added.
    #[must_use]
    pub const fn packet_count(&self) -> usize {
        self.packets
    }

    /// Returns `true` if no pixel has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        let scale = self.header.scale;
        let rows = self.last_row.map_or(0, |row| row.saturating_add(1));
        Dimensions::new(
            self.widest.saturating_mul(scale),
            rows.saturating_mul(scale),
        )
    }

    /// Writes the complete container text.
    pub fn write_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let mut header = self.header.clone();
        header.dimensions = self.dimensions();
        write_header(out, &header)?;
        for placed in &self.pixels {
            write_pixel(out, placed, header.scale)?;
        }
        write_footer(out)
    }

    /// Renders the complete container text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut text);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::BitsPerPixel;

    use crate::body::BodyDecoder;
    use crate::parser::parse_header;

    #[test]
    fn dimensions_follow_rows() {
        let header = ContainerHeader::new(BitsPerPixel::TRUE_COLOR).with_scale(2);
        let mut image = ContainerImage::new(header);
        assert!(image.is_empty());
        assert_eq!(image.dimensions(), Dimensions::new(0, 0));

        assert_eq!(image.add_packet(&[1, 2, 3, 4, 5, 6, 7], 0, 0), 3);
        assert_eq!(image.add_packet(&[1, 2, 3], 4, 0), 1);
        assert_eq!(image.packet_count(), 2);
        assert_eq!(image.dimensions(), Dimensions::new(6, 10));
    }

    #[test]
    fn x_limit_truncates_rows() {
        let mut image = ContainerImage::new(ContainerHeader::new(BitsPerPixel::MONOCHROME));
        assert_eq!(image.add_packet(&[0xFF; 4], 0, 10), 10);
        assert_eq!(image.dimensions().width, 10);
    }

    #[test]
    fn rendered_image_decodes() {
        let header = ContainerHeader::new(BitsPerPixel::TRUE_COLOR).with_capture("t", "s", "f");
        let mut image = ContainerImage::new(header);
        image.add_packet(&[10, 20, 30, 40], 0, 0);
        image.add_packet(&[50, 60, 70], 1, 0);

        let text = image.render();
        let mut lines = text.lines();
        let header = parse_header(&mut lines).unwrap();
        assert_eq!(header.dimensions, Dimensions::new(2, 2));

        let mut body = BodyDecoder::new(&header);
        let mut packets = Vec::new();
        for line in lines {
            packets.extend(body.feed(line).unwrap());
        }
        assert!(body.is_finished());
        assert_eq!(packets, vec![vec![10, 20, 30, 40, 0, 0], vec![50, 60, 70]]);
    }
}
