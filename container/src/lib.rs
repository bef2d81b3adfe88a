//! Versioned SVG container format for netviz pixel images.
//!
//! A container is an SVG document with one element per line: the image
//! dimensions, a metadata comment whose field list depends on the format
//! version, one `<rect>` per pixel and the closing tag. This crate writes and
//! parses that text; it does no I/O of its own.
//!
//! # Design Principles
//!
//! - **Versioned header** - Each revision is a static, ordered field table.
//! - **Line oriented** - Parsing is fed one line at a time and never buffers
//!   more than one pixel row.
//! - **Typed metadata** - Header values are validated into codec types.

mod body;
mod error;
mod header;
mod image;
mod limits;
mod parser;
mod writer;

pub use body::{parse_body_line, BodyDecoder, BodyLine, BODY_TERMINATOR};
pub use error::{ContainerError, ContainerResult};
pub use header::{ContainerHeader, Dimensions, FormatVersion, HeaderField};
pub use image::ContainerImage;
pub use limits::{Limits, DEFAULT_ROW_PIXELS, MAX_ROW_PIXELS};
pub use parser::{parse_header, HeaderParser, HeaderStage, Progress};
pub use writer::{write_footer, write_header, write_pixel, TOOL_NAME};
