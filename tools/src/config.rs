//! Settings file, command-line overrides and validation.
//!
//! Precedence is defaults, then the TOML settings file, then flags. Nothing
//! starts until [`Settings::visualize_config`] has accepted the result.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use codec::{BitsPerPixel, CodecError, LogicTransform};
use container::{ContainerError, Limits, DEFAULT_ROW_PIXELS};
use serde::Deserialize;

/// Tool settings as read from a settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Bits per pixel (default 24).
    #[serde(default = "default_bits")]
    pub bits: u32,
    /// Packets to read from the source; 0 reads everything (default 25).
    #[serde(default = "default_count")]
    pub count: usize,
    /// Packets per image in the fixed layout (default 25).
    #[serde(default = "default_packets_per_image")]
    pub packets_per_image: usize,
    /// Microseconds per image; 0 disables time slicing.
    #[serde(default)]
    pub time_slice: u64,
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Pixels per row (default 1500).
    #[serde(default = "default_x_limit")]
    pub x_limit: u32,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Capture filter, recorded in the header.
    #[serde(default)]
    pub filter: String,
    /// Render to the terminal instead of writing images.
    #[serde(default)]
    pub terminal: bool,
    #[serde(default = "default_logic_gate")]
    pub logic_gate: String,
    #[serde(default = "default_logic_operand")]
    pub logic_operand: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory output files are created in.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_bits() -> u32 {
    24
}
fn default_count() -> usize {
    25
}
fn default_packets_per_image() -> usize {
    25
}
fn default_scale() -> u32 {
    1
}
fn default_x_limit() -> u32 {
    DEFAULT_ROW_PIXELS
}
fn default_prefix() -> String {
    "image".to_string()
}
fn default_logic_gate() -> String {
    "none".to_string()
}
fn default_logic_operand() -> String {
    "0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bits: default_bits(),
            count: default_count(),
            packets_per_image: default_packets_per_image(),
            time_slice: 0,
            scale: default_scale(),
            x_limit: default_x_limit(),
            prefix: default_prefix(),
            filter: String::new(),
            terminal: false,
            logic_gate: default_logic_gate(),
            logic_operand: default_logic_operand(),
            log_level: default_log_level(),
            output_dir: default_output_dir(),
        }
    }
}

/// Invalid or contradictory settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unsupported bits-per-pixel, bad operand or unknown gate.
    Codec(CodecError),
    /// Row limit larger than a jumbo frame.
    Container(ContainerError),
    ZeroScale,
    ZeroPacketsPerImage,
    TerminalWithTimeSlice,
    TerminalWithScale { scale: u32 },
    /// The settings file is not valid TOML for [`Settings`].
    Parse { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(err) => write!(f, "{err}"),
            Self::Container(err) => write!(f, "{err}"),
            Self::ZeroScale => write!(f, "scale factor has to be at least 1"),
            Self::ZeroPacketsPerImage => write!(f, "packets per image has to be at least 1"),
            Self::TerminalWithTimeSlice => {
                write!(f, "terminal output can't be combined with time slicing")
            }
            Self::TerminalWithScale { scale } => {
                write!(f, "terminal output can't be combined with scale {scale}")
            }
            Self::Parse { message } => write!(f, "invalid settings file: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            Self::Container(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for ConfigError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}

impl From<ContainerError> for ConfigError {
    fn from(err: ContainerError) -> Self {
        Self::Container(err)
    }
}

/// How packets are grouped into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// A fixed number of packets per image, one row each.
    Fixed { packets_per_image: usize },
    /// One image per time window; rows are elapsed microseconds.
    TimeSliced { slice_micros: i64 },
    /// Two packets per terminal line.
    Terminal,
}

/// Validated settings for the forward direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizeConfig {
    pub mode: BitsPerPixel,
    /// Packets to read; 0 means no limit.
    pub count: usize,
    pub layout: Layout,
    pub scale: u32,
    pub limits: Limits,
    pub prefix: String,
    pub output_dir: PathBuf,
    pub transform: LogicTransform,
    /// Name of the capture source, recorded in the header.
    pub source: String,
    pub filter: String,
}

/// Settings for the reverse direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructConfig {
    pub prefix: String,
    pub output_dir: PathBuf,
    /// Re-apply a recorded self-inverse transform to every packet.
    pub undo_logic: bool,
}

impl ReconstructConfig {
    /// Path of the capture file written by reconstruction.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.pcap", self.prefix))
    }
}

impl Settings {
    /// Parses settings from TOML text. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })
    }

    /// Loads settings from `path`, or returns the defaults when no path is
    /// given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("read settings {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parse settings {}", path.display()))
    }

    /// Checks the settings and resolves them for visualizing `source`.
    pub fn visualize_config(&self, source: &str) -> Result<VisualizeConfig, ConfigError> {
        let mode = BitsPerPixel::new(self.bits)?;
        let transform = LogicTransform::parse(&self.logic_gate, &self.logic_operand)?;
        let limits = Limits::new(self.x_limit)?;
        if self.scale == 0 {
            return Err(ConfigError::ZeroScale);
        }

        let layout = if self.terminal {
            if self.time_slice > 0 {
                return Err(ConfigError::TerminalWithTimeSlice);
            }
            if self.scale != 1 {
                return Err(ConfigError::TerminalWithScale { scale: self.scale });
            }
            Layout::Terminal
        } else if self.time_slice > 0 {
            Layout::TimeSliced {
                slice_micros: i64::try_from(self.time_slice).unwrap_or(i64::MAX),
            }
        } else {
            if self.packets_per_image == 0 {
                return Err(ConfigError::ZeroPacketsPerImage);
            }
            Layout::Fixed {
                packets_per_image: self.packets_per_image,
            }
        };

        Ok(VisualizeConfig {
            mode,
            count: self.count,
            layout,
            scale: self.scale,
            limits,
            prefix: self.prefix.clone(),
            output_dir: self.output_dir.clone(),
            transform,
            source: source.to_string(),
            filter: self.filter.clone(),
        })
    }

    /// Resolves the settings used when reconstructing.
    #[must_use]
    pub fn reconstruct_config(&self, undo_logic: bool) -> ReconstructConfig {
        ReconstructConfig {
            prefix: self.prefix.clone(),
            output_dir: self.output_dir.clone(),
            undo_logic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::{LogicGate, OperandReason};

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bits, 24);
        assert_eq!(settings.count, 25);
        assert_eq!(settings.packets_per_image, 25);
        assert_eq!(settings.time_slice, 0);
        assert_eq!(settings.scale, 1);
        assert_eq!(settings.x_limit, 1500);
        assert_eq!(settings.prefix, "image");
        assert_eq!(settings.logic_gate, "none");
        assert_eq!(settings.log_level, "info");

        let config = settings.visualize_config("eth0").unwrap();
        assert_eq!(config.layout, Layout::Fixed { packets_per_image: 25 });
        assert!(config.transform.is_identity());
        assert_eq!(config.source, "eth0");
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn toml_overrides_some_keys() {
        let settings = Settings::from_toml(
            "bits = 12\nscale = 2\nlogic_gate = \"xor\"\nlogic_operand = \"0x5a\"\n",
        )
        .unwrap();
        assert_eq!(settings.bits, 12);
        assert_eq!(settings.count, 25);
        let config = settings.visualize_config("f").unwrap();
        assert_eq!(config.transform, LogicTransform::new(LogicGate::Xor, 0x5A));
        assert_eq!(config.scale, 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Settings::from_toml("colour = 3"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn unsupported_bits() {
        let settings = Settings {
            bits: 26,
            ..Settings::default()
        };
        assert_eq!(
            settings.visualize_config("f"),
            Err(ConfigError::Codec(CodecError::UnsupportedBitsPerPixel {
                bits: 26
            }))
        );
    }

    #[test]
    fn bad_operand() {
        let settings = Settings {
            logic_gate: "and".to_string(),
            logic_operand: "300".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.visualize_config("f"),
            Err(ConfigError::Codec(CodecError::InvalidOperand {
                reason: OperandReason::OutOfRange { value: 300 },
                ..
            }))
        ));
    }

    #[test]
    fn row_limit_above_jumbo_frame() {
        let settings = Settings {
            x_limit: 9001,
            ..Settings::default()
        };
        assert!(matches!(
            settings.visualize_config("f"),
            Err(ConfigError::Container(ContainerError::RowLimitTooLarge { .. }))
        ));
    }

    #[test]
    fn terminal_conflicts() {
        let terminal = Settings {
            terminal: true,
            ..Settings::default()
        };
        assert_eq!(
            terminal.visualize_config("f").unwrap().layout,
            Layout::Terminal
        );
        let sliced = Settings {
            time_slice: 10,
            ..terminal.clone()
        };
        assert_eq!(
            sliced.visualize_config("f"),
            Err(ConfigError::TerminalWithTimeSlice)
        );
        let scaled = Settings {
            scale: 2,
            ..terminal
        };
        assert_eq!(
            scaled.visualize_config("f"),
            Err(ConfigError::TerminalWithScale { scale: 2 })
        );
    }

    #[test]
    fn zero_scale_and_zero_batch() {
        let settings = Settings {
            scale: 0,
            ..Settings::default()
        };
        assert_eq!(settings.visualize_config("f"), Err(ConfigError::ZeroScale));
        let settings = Settings {
            packets_per_image: 0,
            ..Settings::default()
        };
        assert_eq!(
            settings.visualize_config("f"),
            Err(ConfigError::ZeroPacketsPerImage)
        );
    }

    #[test]
    fn time_slice_layout() {
        let settings = Settings {
            time_slice: 500,
            ..Settings::default()
        };
        assert_eq!(
            settings.visualize_config("f").unwrap().layout,
            Layout::TimeSliced { slice_micros: 500 }
        );
    }

    #[test]
    fn reconstruct_output_path() {
        let settings = Settings {
            prefix: "rebuilt".to_string(),
            output_dir: PathBuf::from("/tmp/out"),
            ..Settings::default()
        };
        let config = settings.reconstruct_config(true);
        assert!(config.undo_logic);
        assert_eq!(config.output_path(), PathBuf::from("/tmp/out/rebuilt.pcap"));
    }
}
