//! Container header types and the per-version field table.

use std::fmt;
use std::str::FromStr;

use codec::{BitsPerPixel, LogicGate, LogicTransform};

use crate::error::{ContainerError, ContainerResult};

/// Container format revision.
///
/// Each revision extends the field list of the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FormatVersion {
    /// Scale and bits-per-pixel only.
    V0_0_3,
    /// Adds capture time, source and filter.
    V0_0_4,
    /// Adds the logic gate and its operand.
    #[default]
    V0_0_5,
}

impl FormatVersion {
    /// Revision written by default.
    pub const LATEST: Self = Self::V0_0_5;

    pub const ALL: [Self; 3] = [Self::V0_0_3, Self::V0_0_4, Self::V0_0_5];

    /// Returns the dotted version string used in the version tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V0_0_3 => "0.0.3",
            Self::V0_0_4 => "0.0.4",
            Self::V0_0_5 => "0.0.5",
        }
    }

    /// Returns the ordered fields a header of this revision carries.
    #[must_use]
    pub fn fields(self) -> impl ExactSizeIterator<Item = HeaderField> {
        self.rules().iter().map(|rule| rule.field)
    }

    /// Returns the field rules of this revision, in header order.
    pub(crate) fn rules(self) -> &'static [FieldRule] {
        let count = match self {
            Self::V0_0_3 => 2,
            Self::V0_0_4 => 5,
            Self::V0_0_5 => FIELD_RULES.len(),
        };
        &FIELD_RULES[..count]
    }
}

impl FromStr for FormatVersion {
    type Err = ContainerError;

    fn from_str(s: &str) -> ContainerResult<Self> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| ContainerError::UnknownVersion {
                found: s.to_string(),
            })
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metadata field inside the header comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Scale,
    BitsPerPixel,
    /// Capture time of the first packet.
    Timestamp,
    Source,
    Filter,
    LogicGate,
    LogicValue,
}

impl HeaderField {
    /// Returns the key written before `=`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Scale => "Scale",
            Self::BitsPerPixel => "BitsPerPixel",
            Self::Timestamp => "DTG",
            Self::Source => "Source",
            Self::Filter => "Filter",
            Self::LogicGate => "LogicGate",
            Self::LogicValue => "LogicValue",
        }
    }

    /// Returns `true` if the value is written in double quotes.
    #[must_use]
    pub const fn is_quoted(self) -> bool {
        !matches!(self, Self::Scale | Self::BitsPerPixel | Self::LogicValue)
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Declared image size in output units (pixels times scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Metadata of one container.
///
/// Fields that the header's [`FormatVersion`] does not carry stay `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: FormatVersion,
    pub dimensions: Dimensions,
    pub scale: u32,
    pub bits_per_pixel: BitsPerPixel,
    pub timestamp: Option<String>,
    pub source: Option<String>,
    pub filter: Option<String>,
    pub logic_gate: Option<LogicGate>,
    pub logic_value: Option<u8>,
}

impl ContainerHeader {
    /// Creates a header of the latest revision at scale 1.
    #[must_use]
    pub const fn new(bits_per_pixel: BitsPerPixel) -> Self {
        Self {
            version: FormatVersion::LATEST,
            dimensions: Dimensions::new(0, 0),
            scale: 1,
            bits_per_pixel,
            timestamp: None,
            source: None,
            filter: None,
            logic_gate: None,
            logic_value: None,
        }
    }

    #[must_use]
    pub const fn with_version(mut self, version: FormatVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub const fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Records where the packets came from.
    #[must_use]
    pub fn with_capture(
        mut self,
        timestamp: impl Into<String>,
        source: impl Into<String>,
        filter: impl Into<String>,
    ) -> Self {
        self.timestamp = Some(timestamp.into());
        self.source = Some(source.into());
        self.filter = Some(filter.into());
        self
    }

    /// Records the transform applied to every payload.
    #[must_use]
    pub const fn with_logic(mut self, transform: LogicTransform) -> Self {
        self.logic_gate = Some(transform.gate);
        self.logic_value = Some(transform.operand);
        self
    }

    /// Returns the recorded transform, or the identity if none was recorded.
    #[must_use]
    pub fn logic(&self) -> LogicTransform {
        LogicTransform::new(
            self.logic_gate.unwrap_or_default(),
            self.logic_value.unwrap_or_default(),
        )
    }

    /// Returns the value of `field` as it is written in the header.
    #[must_use]
    pub fn field_value(&self, field: HeaderField) -> String {
        match field {
            HeaderField::Scale => self.scale.to_string(),
            HeaderField::BitsPerPixel => self.bits_per_pixel.to_string(),
            HeaderField::Timestamp => self.timestamp.clone().unwrap_or_default(),
            HeaderField::Source => self.source.clone().unwrap_or_default(),
            HeaderField::Filter => self.filter.clone().unwrap_or_default(),
            HeaderField::LogicGate => self.logic_gate.unwrap_or_default().to_string(),
            HeaderField::LogicValue => self.logic_value.unwrap_or_default().to_string(),
        }
    }
}

impl Default for ContainerHeader {
    fn default() -> Self {
        Self::new(BitsPerPixel::default())
    }
}

/// How one header field is recognised and stored.
pub(crate) struct FieldRule {
    pub field: HeaderField,
    pub store: fn(&mut ContainerHeader, &str) -> ContainerResult<()>,
}

impl FieldRule {
    /// Returns the raw value if `line` declares this field.
    ///
    /// Numeric fields need a non-empty run of ASCII digits; quoted fields need a
    /// double-quoted value without inner quotes. Anything else does not match.
    pub fn matches<'a>(&self, line: &'a str) -> Option<&'a str> {
        let value = line
            .trim()
            .strip_prefix(self.field.key())?
            .strip_prefix('=')?;
        if self.field.is_quoted() {
            let inner = value.strip_prefix('"')?.strip_suffix('"')?;
            (!inner.contains('"')).then_some(inner)
        } else {
            (!value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())).then_some(value)
        }
    }
}

/// Every known field in header order. Each revision uses a prefix of it.
static FIELD_RULES: [FieldRule; 7] = [
    FieldRule {
        field: HeaderField::Scale,
        store: store_scale,
    },
    FieldRule {
        field: HeaderField::BitsPerPixel,
        store: store_bits_per_pixel,
    },
    FieldRule {
        field: HeaderField::Timestamp,
        store: store_timestamp,
    },
    FieldRule {
        field: HeaderField::Source,
        store: store_source,
    },
    FieldRule {
        field: HeaderField::Filter,
        store: store_filter,
    },
    FieldRule {
        field: HeaderField::LogicGate,
        store: store_logic_gate,
    },
    FieldRule {
        field: HeaderField::LogicValue,
        store: store_logic_value,
    },
];

fn invalid(field: HeaderField, value: &str) -> ContainerError {
    ContainerError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn store_scale(header: &mut ContainerHeader, value: &str) -> ContainerResult<()> {
    header.scale = value
        .parse()
        .ok()
        .filter(|&scale| scale > 0)
        .ok_or_else(|| invalid(HeaderField::Scale, value))?;
    Ok(())
}

fn store_bits_per_pixel(header: &mut ContainerHeader, value: &str) -> ContainerResult<()> {
    header.bits_per_pixel = value
        .parse::<u32>()
        .ok()
        .and_then(|bits| BitsPerPixel::new(bits).ok())
        .ok_or_else(|| invalid(HeaderField::BitsPerPixel, value))?;
    Ok(())
}

fn store_timestamp(header: &mut ContainerHeader, value: &str) -> ContainerResult<()> {
    header.timestamp = Some(value.to_string());
    Ok(())
}

fn store_source(header: &mut ContainerHeader, value: &str) -> ContainerResult<()> {
    header.source = Some(value.to_string());
    Ok(())
}

fn store_filter(header: &mut ContainerHeader, value: &str) -> ContainerResult<()> {
    header.filter = Some(value.to_string());
    Ok(())
}

fn store_logic_gate(header: &mut ContainerHeader, value: &str) -> ContainerResult<()> {
    let gate = value
        .parse()
        .map_err(|_| invalid(HeaderField::LogicGate, value))?;
    header.logic_gate = Some(gate);
    Ok(())
}

fn store_logic_value(header: &mut ContainerHeader, value: &str) -> ContainerResult<()> {
    let operand = value
        .parse()
        .map_err(|_| invalid(HeaderField::LogicValue, value))?;
    header.logic_value = Some(operand);
    Ok(())
}
