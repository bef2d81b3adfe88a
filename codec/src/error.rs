//! Error types for codec operations.

use std::fmt;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while packing payloads into pixels and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Bits-per-pixel is neither 1 nor a multiple of 3 up to 24.
    UnsupportedBitsPerPixel { bits: u32 },

    /// A pixel declaration lies outside the configured row width.
    OutOfBounds {
        /// The offending x-coordinate.
        x: u32,
        /// The exclusive upper bound.
        limit: u32,
    },

    /// A logic operand could not be turned into a byte.
    InvalidOperand {
        /// The operand text as supplied.
        input: String,
        reason: OperandReason,
    },

    /// Logic gate name is not one of xor/or/and/not/nand/none.
    UnknownLogicGate { name: String },
}

/// Details for invalid operand errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandReason {
    Empty,
    NotANumber,
    OutOfRange { value: u64 },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedBitsPerPixel { bits } => {
                write!(
                    f,
                    "unsupported bits-per-pixel: {bits} (must be 1 or a multiple of 3 up to 24)"
                )
            }
            Self::OutOfBounds { x, limit } => {
                write!(f, "x-coordinate {x} is out of bounds (limit {limit})")
            }
            Self::InvalidOperand { input, reason } => {
                write!(f, "invalid logic operand {input:?}: {reason}")
            }
            Self::UnknownLogicGate { name } => {
                write!(f, "unknown logic gate: {name:?}")
            }
        }
    }
}

impl fmt::Display for OperandReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty operand"),
            Self::NotANumber => write!(f, "not a number"),
            Self::OutOfRange { value } => write!(f, "{value} does not fit in a byte"),
        }
    }
}

impl std::error::Error for CodecError {}
