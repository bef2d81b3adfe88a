//! Classic libpcap capture files.
//!
//! Only the original format is handled (not pcapng). Files in either byte
//! order and with micro- or nanosecond timestamps are read; files are always
//! written little-endian with microsecond timestamps.

use std::io::{self, Read, Write};

/// Link type for Ethernet frames.
pub const LINKTYPE_ETHERNET: u32 = 1;

/// Snapshot length written into new files.
pub const DEFAULT_SNAPLEN: u32 = 65_536;

const MAGIC_MICROS: u32 = 0xA1B2_C3D4;
const MAGIC_NANOS: u32 = 0xA1B2_3C4D;
const VERSION_MAJOR: u16 = 2;
const VERSION_MINOR: u16 = 4;
const GLOBAL_HEADER_LEN: usize = 24;
const RECORD_HEADER_LEN: usize = 16;

/// Records larger than this are treated as corruption.
const MAX_RECORD_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u32(self, bytes: &[u8]) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[..4]);
        match self {
            Self::Little => u32::from_le_bytes(raw),
            Self::Big => u32::from_be_bytes(raw),
        }
    }
}

/// One captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcapRecord {
    /// Capture time in microseconds since the Unix epoch.
    pub timestamp_micros: i64,
    /// Captured bytes (possibly truncated to the snapshot length).
    pub data: Vec<u8>,
    /// Length of the frame on the wire.
    pub original_len: u32,
}

/// Reads records from a classic pcap stream.
#[derive(Debug)]
pub struct PcapReader<R> {
    reader: R,
    order: ByteOrder,
    nanos: bool,
    snaplen: u32,
    link_type: u32,
}

impl<R: Read> PcapReader<R> {
    /// Reads and checks the global header.
    pub fn new(mut reader: R) -> io::Result<Self> {
        let mut header = [0u8; GLOBAL_HEADER_LEN];
        reader.read_exact(&mut header)?;

        let little = ByteOrder::Little.u32(&header);
        let (order, nanos) = match (little, ByteOrder::Big.u32(&header)) {
            (MAGIC_MICROS, _) => (ByteOrder::Little, false),
            (MAGIC_NANOS, _) => (ByteOrder::Little, true),
            (_, MAGIC_MICROS) => (ByteOrder::Big, false),
            (_, MAGIC_NANOS) => (ByteOrder::Big, true),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("not a pcap file (magic 0x{little:08X})"),
                ))
            }
        };

        Ok(Self {
            reader,
            order,
            nanos,
            snaplen: order.u32(&header[16..]),
            link_type: order.u32(&header[20..]),
        })
    }

    #[must_use]
    pub const fn link_type(&self) -> u32 {
        self.link_type
    }

    #[must_use]
    pub const fn snaplen(&self) -> u32 {
        self.snaplen
    }

    /// Returns the next record, or `None` at a clean end of file.
    pub fn next_record(&mut self) -> io::Result<Option<PcapRecord>> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        if !read_full_or_eof(&mut self.reader, &mut header)? {
            return Ok(None);
        }

        let seconds = i64::from(self.order.u32(&header));
        let fraction = i64::from(self.order.u32(&header[4..]));
        let captured = self.order.u32(&header[8..]);
        let original_len = self.order.u32(&header[12..]);
        if captured > MAX_RECORD_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("record of {captured} bytes exceeds {MAX_RECORD_LEN}"),
            ));
        }

        let mut data = vec![0u8; captured as usize];
        self.reader.read_exact(&mut data)?;

        let micros = if self.nanos { fraction / 1_000 } else { fraction };
        Ok(Some(PcapRecord {
            timestamp_micros: seconds * 1_000_000 + micros,
            data,
            original_len,
        }))
    }
}

/// Fills `buf` completely, or returns `false` if the stream ended before the
/// first byte. A stream ending part way through is an error.
fn read_full_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated pcap record header",
                ))
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}

/// Writes a classic pcap stream.
#[derive(Debug)]
pub struct PcapWriter<W: Write> {
    writer: W,
    snaplen: u32,
}

impl<W: Write> PcapWriter<W> {
    /// Writes the global header.
    pub fn new(mut writer: W, snaplen: u32, link_type: u32) -> io::Result<Self> {
        let mut header = Vec::with_capacity(GLOBAL_HEADER_LEN);
        header.extend_from_slice(&MAGIC_MICROS.to_le_bytes());
        header.extend_from_slice(&VERSION_MAJOR.to_le_bytes());
        header.extend_from_slice(&VERSION_MINOR.to_le_bytes());
        header.extend_from_slice(&0i32.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&snaplen.to_le_bytes());
        header.extend_from_slice(&link_type.to_le_bytes());
        writer.write_all(&header)?;
        Ok(Self { writer, snaplen })
    }

    /// Appends one record. Data beyond the snapshot length is cut off.
    pub fn write_packet(&mut self, timestamp_micros: i64, data: &[u8]) -> io::Result<()> {
        let original_len = u32::try_from(data.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "packet larger than 4 GiB")
        })?;
        let captured = original_len.min(self.snaplen);
        let micros = timestamp_micros.max(0);
        let seconds = u32::try_from(micros / 1_000_000).unwrap_or(u32::MAX);
        let fraction = u32::try_from(micros % 1_000_000).unwrap_or(0);

        let mut header = [0u8; RECORD_HEADER_LEN];
        header[..4].copy_from_slice(&seconds.to_le_bytes());
        header[4..8].copy_from_slice(&fraction.to_le_bytes());
        header[8..12].copy_from_slice(&captured.to_le_bytes());
        header[12..].copy_from_slice(&original_len.to_le_bytes());
        self.writer.write_all(&header)?;
        self.writer.write_all(&data[..captured as usize])
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
