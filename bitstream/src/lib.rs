//! Bit cursor primitives for the netviz pixel codec.
//!
//! This crate provides [`BitCursor`], an explicit (byte, bit) position that the
//! encoder and decoder thread through their helpers instead of sharing ambient
//! position state.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Panic-free** - Queries past the end of a buffer return `None`.
//! - **No domain knowledge** - This crate knows nothing about pixels or packets.
//!
//! # Example
//!
//! ```
//! use bitstream::BitCursor;
//!
//! let payload = [0b1000_0001];
//! let mut cursor = BitCursor::new();
//!
//! assert_eq!(cursor.masked_bit(&payload), Some(0x80));
//! cursor.advance(7);
//! assert_eq!(cursor.masked_bit(&payload), Some(0x01));
//! cursor.advance(1);
//! assert!(cursor.is_at_end(payload.len()));
//! assert_eq!(cursor.masked_bit(&payload), None);
//! ```

mod cursor;

pub use cursor::BitCursor;
