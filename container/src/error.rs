//! Error types for container operations.

use std::fmt;

use codec::CodecError;

use crate::header::{FormatVersion, HeaderField};
use crate::parser::HeaderStage;

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Errors raised while reading a container.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContainerError {
    /// Version tag names a revision this build does not know.
    UnknownVersion { found: String },

    /// The comment-close marker arrived before every field was read.
    HeaderIncomplete {
        version: FormatVersion,
        /// First field that was never matched.
        missing: HeaderField,
    },

    /// Input ended before the header was complete.
    NoTerminator {
        /// Parser stage reached when input ran out.
        stage: HeaderStage,
    },

    /// A field matched but its value is unusable.
    InvalidField { field: HeaderField, value: String },

    /// Requested row width exceeds the largest supported frame.
    RowLimitTooLarge { requested: u32, max: u32 },

    /// Body decoding failed.
    Codec(CodecError),
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVersion { found } => {
                write!(f, "unknown container version: {found:?}")
            }
            Self::HeaderIncomplete { version, missing } => {
                write!(
                    f,
                    "header incomplete: version {version} requires {missing} before the comment closes"
                )
            }
            Self::NoTerminator { stage } => {
                write!(f, "no end of header found (input ended while {stage})")
            }
            Self::InvalidField { field, value } => {
                write!(f, "invalid value for {field}: {value:?}")
            }
            Self::RowLimitTooLarge { requested, max } => {
                write!(f, "row limit {requested} exceeds the maximum of {max} pixels")
            }
            Self::Codec(err) => write!(f, "body decode error: {err}"),
        }
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for ContainerError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn unknown_version_display() {
        let err = ContainerError::UnknownVersion {
            found: "9.9.9".to_string(),
        };
        assert!(err.to_string().contains("9.9.9"));
    }

    #[test]
    fn header_incomplete_names_field() {
        let err = ContainerError::HeaderIncomplete {
            version: FormatVersion::V0_0_4,
            missing: HeaderField::Source,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.0.4"));
        assert!(msg.contains("Source"));
    }

    #[test]
    fn no_terminator_names_stage() {
        let err = ContainerError::NoTerminator {
            stage: HeaderStage::Version,
        };
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn codec_error_is_source() {
        let err = ContainerError::from(CodecError::OutOfBounds { x: 4, limit: 3 });
        assert!(err.source().is_some());
        assert!(err.to_string().contains("out of bounds"));
    }
}
