//! Grouping of packets into images or terminal lines.

use codec::{FixedRows, RowIndex, TimeSlicedRows};
use container::{ContainerHeader, ContainerImage};

use crate::capture::CapturedPacket;
use crate::config::{Layout, VisualizeConfig};
use crate::render::render_pair;
use crate::timefmt::{format_header_time, format_rfc3339};

/// An image together with the file name it is written under.
#[derive(Debug, Clone)]
pub struct NamedImage {
    pub name: String,
    pub image: ContainerImage,
}

/// A finished unit of output.
#[derive(Debug, Clone)]
pub enum Rendered {
    Image(NamedImage),
    TerminalLine(String),
}

#[derive(Debug, Clone)]
enum Rows {
    Fixed(FixedRows),
    TimeSliced(TimeSlicedRows),
}

impl RowIndex for Rows {
    fn row_for(&mut self, timestamp_micros: i64) -> u32 {
        match self {
            Self::Fixed(rows) => rows.row_for(timestamp_micros),
            Self::TimeSliced(rows) => rows.row_for(timestamp_micros),
        }
    }
}

#[derive(Debug, Clone)]
struct Batch {
    image: ContainerImage,
    rows: Rows,
    first_micros: i64,
}

/// Turns a packet stream into output units according to the layout.
#[derive(Debug, Clone)]
pub struct Assembler {
    config: VisualizeConfig,
    batch: Option<Batch>,
    /// Number of the next fixed-layout image, starting at 1.
    index: usize,
    /// Terminal layout: the packet waiting for its partner.
    pending_top: Option<Vec<u8>>,
}

impl Assembler {
    #[must_use]
    pub const fn new(config: VisualizeConfig) -> Self {
        Self {
            config,
            batch: None,
            index: 1,
            pending_top: None,
        }
    }

    /// Adds a (transformed) packet. Returns output that became complete.
    pub fn push(&mut self, packet: CapturedPacket) -> Option<Rendered> {
        match self.config.layout {
            Layout::Terminal => self.push_terminal(packet.payload),
            Layout::Fixed { packets_per_image } => {
                self.add_to_batch(&packet);
                let full = self
                    .batch
                    .as_ref()
                    .is_some_and(|batch| batch.image.packet_count() >= packets_per_image);
                if full {
                    self.take_batch()
                } else {
                    None
                }
            }
            Layout::TimeSliced { slice_micros } => {
                let expired = self.batch.as_ref().is_some_and(|batch| {
                    packet.timestamp_micros > batch.first_micros.saturating_add(slice_micros)
                });
                let done = if expired { self.take_batch() } else { None };
                self.add_to_batch(&packet);
                done
            }
        }
    }

    /// Flushes whatever is still pending.
    pub fn finish(&mut self) -> Option<Rendered> {
        if let Some(top) = self.pending_top.take() {
            return Some(Rendered::TerminalLine(render_pair(
                &top,
                None,
                self.config.mode,
                self.config.limits.row_pixels,
            )));
        }
        self.take_batch()
    }

    fn push_terminal(&mut self, payload: Vec<u8>) -> Option<Rendered> {
        let Some(top) = self.pending_top.take() else {
            self.pending_top = Some(payload);
            return None;
        };
        Some(Rendered::TerminalLine(render_pair(
            &top,
            Some(&payload),
            self.config.mode,
            self.config.limits.row_pixels,
        )))
    }

    fn add_to_batch(&mut self, packet: &CapturedPacket) {
        let config = &self.config;
        let batch = self.batch.get_or_insert_with(|| {
            let header = ContainerHeader::new(config.mode)
                .with_scale(config.scale)
                .with_capture(
                    format_header_time(packet.timestamp_micros),
                    config.source.as_str(),
                    config.filter.as_str(),
                )
                .with_logic(config.transform);
            let rows = match config.layout {
                Layout::TimeSliced { .. } => Rows::TimeSliced(TimeSlicedRows::new()),
                _ => Rows::Fixed(FixedRows::new()),
            };
            Batch {
                image: ContainerImage::new(header),
                rows,
                first_micros: packet.timestamp_micros,
            }
        });
        let y = batch.rows.row_for(packet.timestamp_micros);
        batch
            .image
            .add_packet(&packet.payload, y, config.limits.row_pixels);
    }

    fn take_batch(&mut self) -> Option<Rendered> {
        let batch = self.batch.take()?;
        let suffix = match self.config.layout {
            Layout::TimeSliced { .. } => format_rfc3339(batch.first_micros),
            _ => {
                let index = self.index;
                self.index += 1;
                index.to_string()
            }
        };
        Some(Rendered::Image(NamedImage {
            name: format!("{}-{suffix}.svg", self.config.prefix),
            image: batch.image,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn config(settings: Settings) -> VisualizeConfig {
        settings.visualize_config("test.pcap").unwrap()
    }

    fn image(rendered: Option<Rendered>) -> NamedImage {
        match rendered {
            Some(Rendered::Image(image)) => image,
            other => panic!("expected an image, got {other:?}"),
        }
    }

    #[test]
    fn fixed_batches_are_numbered() {
        let mut assembler = Assembler::new(config(Settings {
            packets_per_image: 2,
            ..Settings::default()
        }));
        assert!(assembler.push(CapturedPacket::new(0, vec![1, 2, 3])).is_none());
        let first = image(assembler.push(CapturedPacket::new(1, vec![4, 5, 6])));
        assert_eq!(first.name, "image-1.svg");
        assert_eq!(first.image.packet_count(), 2);

        assert!(assembler.push(CapturedPacket::new(2, vec![7])).is_none());
        let rest = image(assembler.finish());
        assert_eq!(rest.name, "image-2.svg");
        assert!(assembler.finish().is_none());
    }

    #[test]
    fn header_records_first_packet_and_source() {
        let mut assembler = Assembler::new(config(Settings::default()));
        assembler.push(CapturedPacket::new(1_000_001, vec![1]));
        let named = image(assembler.finish());
        let header = named.image.header();
        assert_eq!(
            header.timestamp.as_deref(),
            Some("1970-01-01 00:00:01.000001 UTC")
        );
        assert_eq!(header.source.as_deref(), Some("test.pcap"));
    }

    #[test]
    fn time_slices_split_on_later_packets() {
        let mut assembler = Assembler::new(config(Settings {
            time_slice: 10,
            ..Settings::default()
        }));
        assert!(assembler.push(CapturedPacket::new(1_000_000, vec![1, 1, 1])).is_none());
        // Exactly at the window edge still belongs to the first image.
        assert!(assembler.push(CapturedPacket::new(1_000_010, vec![2, 2, 2])).is_none());
        let first = image(assembler.push(CapturedPacket::new(1_000_011, vec![3, 3, 3])));
        assert_eq!(first.name, "image-1970-01-01T00:00:01Z.svg");
        assert_eq!(first.image.dimensions().height, 11);

        let second = image(assembler.finish());
        assert_eq!(second.name, "image-1970-01-01T00:00:01.000011Z.svg");
        assert_eq!(second.image.dimensions().height, 1);
    }

    #[test]
    fn terminal_pairs_packets() {
        let mut assembler = Assembler::new(config(Settings {
            terminal: true,
            ..Settings::default()
        }));
        assert!(assembler.push(CapturedPacket::new(0, vec![1, 2, 3])).is_none());
        assert!(matches!(
            assembler.push(CapturedPacket::new(0, vec![4, 5, 6])),
            Some(Rendered::TerminalLine(_))
        ));
        assert!(assembler.push(CapturedPacket::new(0, vec![7, 8, 9])).is_none());
        match assembler.finish() {
            Some(Rendered::TerminalLine(line)) => assert!(line.contains("48;2;0;0;0m")),
            other => panic!("expected a terminal line, got {other:?}"),
        }
        assert!(assembler.finish().is_none());
    }
}
