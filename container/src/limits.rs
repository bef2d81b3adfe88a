//! Row width limits.

use crate::error::{ContainerError, ContainerResult};

/// Pixels per row when nothing else is configured.
pub const DEFAULT_ROW_PIXELS: u32 = 1500;

/// Largest accepted row width, sized for a jumbo frame at one byte per pixel.
pub const MAX_ROW_PIXELS: u32 = 9000;

/// Limits applied while laying packets out into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum pixels per row; `0` means unbounded.
    pub row_pixels: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            row_pixels: DEFAULT_ROW_PIXELS,
        }
    }
}

impl Limits {
    /// Creates limits with a checked row width.
    pub const fn new(row_pixels: u32) -> ContainerResult<Self> {
        if row_pixels > MAX_ROW_PIXELS {
            return Err(ContainerError::RowLimitTooLarge {
                requested: row_pixels,
                max: MAX_ROW_PIXELS,
            });
        }
        Ok(Self { row_pixels })
    }
}
