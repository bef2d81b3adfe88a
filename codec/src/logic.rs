//! Bitwise payload preprocessing applied before encoding.

use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, CodecResult, OperandReason};

/// A bitwise gate combining each payload byte with an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicGate {
    Xor,
    Or,
    And,
    /// Bitwise complement; ignores the operand.
    Not,
    /// `byte & !operand`.
    Nand,
    #[default]
    None,
}

impl LogicGate {
    pub const ALL: [Self; 6] = [
        Self::Xor,
        Self::Or,
        Self::And,
        Self::Not,
        Self::Nand,
        Self::None,
    ];

    /// Returns the lowercase name recorded in container headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xor => "xor",
            Self::Or => "or",
            Self::And => "and",
            Self::Not => "not",
            Self::Nand => "nand",
            Self::None => "none",
        }
    }

    /// Applies the gate to one byte.
    #[must_use]
    pub const fn apply(self, byte: u8, operand: u8) -> u8 {
        match self {
            Self::Xor => byte ^ operand,
            Self::Or => byte | operand,
            Self::And => byte & operand,
            Self::Not => !byte,
            Self::Nand => byte & !operand,
            Self::None => byte,
        }
    }

    /// Returns `true` if applying the gate twice restores the input.
    ///
    /// `or`, `and` and `nand` destroy bits, so payloads transformed with them
    /// cannot be recovered.
    #[must_use]
    pub const fn is_self_inverse(self) -> bool {
        matches!(self, Self::Xor | Self::Not | Self::None)
    }
}

impl FromStr for LogicGate {
    type Err = CodecError;

    fn from_str(name: &str) -> CodecResult<Self> {
        Self::ALL
            .into_iter()
            .find(|gate| gate.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CodecError::UnknownLogicGate {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for LogicGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gate paired with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LogicTransform {
    pub gate: LogicGate,
    pub operand: u8,
}

impl LogicTransform {
    /// Creates a transform.
    #[must_use]
    pub const fn new(gate: LogicGate, operand: u8) -> Self {
        Self { gate, operand }
    }

    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(LogicGate::None, 0)
    }

    /// Parses a gate name and operand text.
    pub fn parse(gate: &str, operand: &str) -> CodecResult<Self> {
        Ok(Self::new(gate.parse()?, parse_operand(operand)?))
    }

    /// Returns `true` if this transform leaves payloads untouched.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        matches!(self.gate, LogicGate::None)
    }

    /// Transforms `payload` in place.
    pub fn apply_in_place(self, payload: &mut [u8]) {
        if self.is_identity() {
            return;
        }
        for byte in payload {
            *byte = self.gate.apply(*byte, self.operand);
        }
    }

    /// Returns a transformed copy of `payload`.
    #[must_use]
    pub fn apply(self, payload: &[u8]) -> Vec<u8> {
        let mut out = payload.to_vec();
        self.apply_in_place(&mut out);
        out
    }

    /// Returns the transform that undoes this one, if any.
    #[must_use]
    pub const fn inverse(self) -> Option<Self> {
        if self.gate.is_self_inverse() {
            Some(self)
        } else {
            None
        }
    }
}

impl fmt::Display for LogicTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0x{:02X}", self.gate, self.operand)
    }
}

/// Parses an operand written in decimal, `0x` hexadecimal or `0b` binary.
pub fn parse_operand(input: &str) -> CodecResult<u8> {
    let invalid = |reason| CodecError::InvalidOperand {
        input: input.to_string(),
        reason,
    };

    let text = input.trim();
    if text.is_empty() {
        return Err(invalid(OperandReason::Empty));
    }
    let (digits, radix) = if let Some(hex) = strip_prefix_ci(text, "0x") {
        (hex, 16)
    } else if let Some(bin) = strip_prefix_ci(text, "0b") {
        (bin, 2)
    } else {
        (text, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid(OperandReason::NotANumber));
    }
    let value = u64::from_str_radix(digits, radix)
        .map_err(|_| invalid(OperandReason::OutOfRange { value: u64::MAX }))?;
    u8::try_from(value).map_err(|_| invalid(OperandReason::OutOfRange { value }))
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}
