//! Packet sources and sinks at the edges of the pipeline.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::pcap::{PcapReader, PcapWriter, DEFAULT_SNAPLEN, LINKTYPE_ETHERNET};

/// A packet as delivered by a capture source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPacket {
    /// Capture time in microseconds since the Unix epoch.
    pub timestamp_micros: i64,
    pub payload: Vec<u8>,
}

impl CapturedPacket {
    #[must_use]
    pub const fn new(timestamp_micros: i64, payload: Vec<u8>) -> Self {
        Self {
            timestamp_micros,
            payload,
        }
    }
}

/// Yields captured packets until exhausted.
pub trait PacketSource {
    /// Returns the next packet, or `None` once the source is exhausted.
    fn next_packet(&mut self) -> Result<Option<CapturedPacket>>;
}

/// Receives reconstructed packets.
pub trait PacketSink {
    fn append_packet(&mut self, timestamp_micros: i64, payload: &[u8]) -> Result<()>;

    /// Called once after the last packet.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reads packets from a classic pcap file.
///
/// Empty frames are skipped; at most `count` frames are read (0 reads all).
pub struct PcapSource<R> {
    reader: PcapReader<R>,
    count: usize,
    read: usize,
}

impl PcapSource<BufReader<File>> {
    /// Opens a capture file.
    pub fn open(path: &Path, count: usize) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open capture {}", path.display()))?;
        Self::new(BufReader::new(file), count)
            .with_context(|| format!("read capture {}", path.display()))
    }
}

impl<R: Read> PcapSource<R> {
    pub fn new(reader: R, count: usize) -> Result<Self> {
        let reader = PcapReader::new(reader).context("read pcap header")?;
        debug!(link_type = reader.link_type(), "opened pcap source");
        Ok(Self {
            reader,
            count,
            read: 0,
        })
    }
}

impl<R: Read> PacketSource for PcapSource<R> {
    fn next_packet(&mut self) -> Result<Option<CapturedPacket>> {
        loop {
            if self.count != 0 && self.read >= self.count {
                return Ok(None);
            }
            let Some(record) = self.reader.next_record().context("read pcap record")? else {
                return Ok(None);
            };
            self.read += 1;
            if record.data.is_empty() {
                continue;
            }
            return Ok(Some(CapturedPacket::new(
                record.timestamp_micros,
                record.data,
            )));
        }
    }
}

/// Serves packets from memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    packets: VecDeque<CapturedPacket>,
}

impl MemorySource {
    pub fn new(packets: impl IntoIterator<Item = CapturedPacket>) -> Self {
        Self {
            packets: packets.into_iter().collect(),
        }
    }
}

impl PacketSource for MemorySource {
    fn next_packet(&mut self) -> Result<Option<CapturedPacket>> {
        Ok(self.packets.pop_front())
    }
}

/// Writes packets to a new classic pcap file.
pub struct PcapSink<W: Write> {
    writer: PcapWriter<W>,
}

impl PcapSink<BufWriter<File>> {
    /// Creates `path`; an existing file is an error.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("create {}", path.display()))?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> PcapSink<W> {
    pub fn new(writer: W) -> Result<Self> {
        let writer = PcapWriter::new(writer, DEFAULT_SNAPLEN, LINKTYPE_ETHERNET)
            .context("write pcap header")?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> PacketSink for PcapSink<W> {
    fn append_packet(&mut self, timestamp_micros: i64, payload: &[u8]) -> Result<()> {
        self.writer
            .write_packet(timestamp_micros, payload)
            .context("write pcap record")
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("flush pcap output")
    }
}

/// Collects packets in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub packets: Vec<CapturedPacket>,
}

impl PacketSink for MemorySink {
    fn append_packet(&mut self, timestamp_micros: i64, payload: &[u8]) -> Result<()> {
        self.packets
            .push(CapturedPacket::new(timestamp_micros, payload.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn capture(frames: &[&[u8]]) -> Vec<u8> {
        let mut sink = PcapSink::new(Vec::new()).unwrap();
        for (i, frame) in frames.iter().enumerate() {
            let ts = i64::try_from(i).unwrap() * 10;
            sink.append_packet(ts, frame).unwrap();
        }
        sink.finish().unwrap();
        sink.into_inner()
    }

    fn drain(source: &mut impl PacketSource) -> Vec<CapturedPacket> {
        let mut out = Vec::new();
        while let Some(packet) = source.next_packet().unwrap() {
            out.push(packet);
        }
        out
    }

    #[test]
    fn pcap_source_skips_empty_frames() {
        let bytes = capture(&[&[1], &[], &[2, 3]]);
        let mut source = PcapSource::new(Cursor::new(bytes), 0).unwrap();
        assert_eq!(
            drain(&mut source),
            vec![
                CapturedPacket::new(0, vec![1]),
                CapturedPacket::new(20, vec![2, 3]),
            ]
        );
    }

    #[test]
    fn count_includes_skipped_frames() {
        let bytes = capture(&[&[1], &[], &[2], &[3]]);
        let mut source = PcapSource::new(Cursor::new(bytes), 3).unwrap();
        let payloads: Vec<Vec<u8>> = drain(&mut source).into_iter().map(|p| p.payload).collect();
        assert_eq!(payloads, vec![vec![1], vec![2]]);
    }

    #[test]
    fn memory_source_and_sink() {
        let mut source = MemorySource::new([CapturedPacket::new(5, vec![9])]);
        let mut sink = MemorySink::default();
        while let Some(packet) = source.next_packet().unwrap() {
            sink.append_packet(packet.timestamp_micros, &packet.payload)
                .unwrap();
        }
        assert_eq!(sink.packets, vec![CapturedPacket::new(5, vec![9])]);
    }
}
