//! Packet payload to pixel encoding and decoding for netviz.
//!
//! This crate maps raw payload bytes onto RGB pixels at a chosen density and
//! back, and handles the per-row bookkeeping around it.
//!
//! # Features
//!
//! - Bits-per-pixel densities of 1 and every multiple of 3 up to 24
//! - Lazy payload → pixel encoding with in-place channel bits
//! - Channel → payload decoding, bit-exact with existing containers
//! - Bitwise payload preprocessing (xor/or/and/not/nand/none)
//! - Row placement and reassembly with width bounds
//!
//! # Design Principles
//!
//! - **Deterministic** - Same inputs produce same outputs.
//! - **Panic-free** - Malformed input surfaces as [`CodecError`].
//! - **No I/O** - Containers and captures are handled by higher layers.

mod decode;
mod error;
mod logic;
mod mode;
mod pixel;
mod rows;

pub use decode::{decode_channels, decode_payload, decode_pixels};
pub use error::{CodecError, CodecResult, OperandReason};
pub use logic::{parse_operand, LogicGate, LogicTransform};
pub use mode::BitsPerPixel;
pub use pixel::{channel_values, encode_payload, Pixel, PixelEncoder};
pub use rows::{
    place_row, FixedRows, PacketRow, PlacedPixel, RowIndex, RowReassembler, TimeSlicedRows,
};
