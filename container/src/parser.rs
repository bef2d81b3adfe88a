//! Line-driven header parser.
//!
//! The parser is fed one line at a time and walks through
//! dimensions → comment open → version tag → fields → done.
//! Lines that do not match the current stage are skipped.

use std::fmt;

use crate::error::{ContainerError, ContainerResult};
use crate::header::{ContainerHeader, Dimensions, FormatVersion};

pub(crate) const COMMENT_OPEN: &str = "<!--";
pub(crate) const COMMENT_CLOSE: &str = "-->";

/// Where the parser currently is in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderStage {
    Dimensions,
    CommentOpen,
    Version,
    Fields,
    Done,
}

impl fmt::Display for HeaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Dimensions => "looking for the image dimensions",
            Self::CommentOpen => "looking for the metadata comment",
            Self::Version => "looking for the version tag",
            Self::Fields => "reading metadata fields",
            Self::Done => "done",
        };
        f.write_str(text)
    }
}

/// Result of feeding one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More lines are needed.
    Pending,
    /// The header is complete; following lines belong to the body.
    Complete,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Dimensions,
    CommentOpen,
    Version,
    Fields {
        version: FormatVersion,
        index: usize,
    },
    Done,
}

/// Incremental container header parser.
#[derive(Debug, Clone)]
pub struct HeaderParser {
    state: State,
    header: ContainerHeader,
    lines: usize,
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Dimensions,
            header: ContainerHeader::default(),
            lines: 0,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> HeaderStage {
        match self.state {
            State::Dimensions => HeaderStage::Dimensions,
            State::CommentOpen => HeaderStage::CommentOpen,
            State::Version => HeaderStage::Version,
            State::Fields { .. } => HeaderStage::Fields,
            State::Done => HeaderStage::Done,
        }
    }

    /// Number of lines fed so far.
    #[must_use]
    pub const fn lines_consumed(&self) -> usize {
        self.lines
    }

    /// Feeds the next line of the container.
    ///
    /// Errors are fatal: the parser must not be fed again afterwards.
    pub fn feed(&mut self, line: &str) -> ContainerResult<Progress> {
        if matches!(self.state, State::Done) {
            return Ok(Progress::Complete);
        }
        self.lines += 1;

        match self.state {
            State::Dimensions => {
                if let Some(dimensions) = match_dimensions(line) {
                    self.header.dimensions = dimensions;
                    self.state = State::CommentOpen;
                }
            }
            State::CommentOpen => {
                if line.trim() == COMMENT_OPEN {
                    self.state = State::Version;
                }
            }
            State::Version => {
                if let Some(tag) = match_version_tag(line) {
                    let version: FormatVersion = tag.parse()?;
                    self.header.version = version;
                    self.state = State::Fields { version, index: 0 };
                }
            }
            State::Fields { version, index } => self.feed_field(line, version, index)?,
            State::Done => {}
        }

        Ok(match self.state {
            State::Done => Progress::Complete,
            _ => Progress::Pending,
        })
    }

    fn feed_field(
        &mut self,
        line: &str,
        version: FormatVersion,
        index: usize,
    ) -> ContainerResult<()> {
        let rules = version.rules();
        if let Some(rule) = rules.get(index) {
            if let Some(value) = rule.matches(line) {
                (rule.store)(&mut self.header, value)?;
                self.state = State::Fields {
                    version,
                    index: index + 1,
                };
                return Ok(());
            }
        }

        if line.trim() == COMMENT_CLOSE {
            if let Some(missing) = rules.get(index) {
                return Err(ContainerError::HeaderIncomplete {
                    version,
                    missing: missing.field,
                });
            }
            self.state = State::Done;
        }
        Ok(())
    }

    /// Returns the parsed header, or [`ContainerError::NoTerminator`] if the
    /// header was never completed.
    pub fn finish(self) -> ContainerResult<ContainerHeader> {
        match self.state {
            State::Done => Ok(self.header),
            _ => Err(ContainerError::NoTerminator {
                stage: self.stage(),
            }),
        }
    }
}

/// Parses a header from `lines`, leaving the iterator at the first body line.
pub fn parse_header<I, S>(lines: &mut I) -> ContainerResult<ContainerHeader>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = HeaderParser::new();
    for line in lines.by_ref() {
        if parser.feed(line.as_ref())? == Progress::Complete {
            break;
        }
    }
    parser.finish()
}

/// Matches `<svg width="W" height="H">`.
fn match_dimensions(line: &str) -> Option<Dimensions> {
    let rest = line.trim().strip_prefix("<svg width=\"")?;
    let (width, rest) = rest.split_once('"')?;
    let rest = rest.strip_prefix(" height=\"")?;
    let (height, rest) = rest.split_once('"')?;
    if rest != ">" {
        return None;
    }
    Some(Dimensions::new(parse_digits(width)?, parse_digits(height)?))
}

/// Matches a `name "x.y.z"` version tag and returns the dotted version.
///
/// The tool name in front of the version is not checked.
fn match_version_tag(line: &str) -> Option<&str> {
    let (name, quoted) = line.trim().split_once(char::is_whitespace)?;
    if name.is_empty() || !name.chars().all(char::is_alphanumeric) {
        return None;
    }
    let version = quoted.trim_start().strip_prefix('"')?.strip_suffix('"')?;
    let well_formed = !version.is_empty()
        && version.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    well_formed.then_some(version)
}

pub(crate) fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderField;
    use codec::{BitsPerPixel, LogicGate};

    const LATEST: &str = "<?xml version=\"1.0\"?>
<svg width=\"6\" height=\"2\">
<!--
\tnetviz \"0.0.5\"
\tScale=1
\tBitsPerPixel=12
\tDTG=\"2024-05-01 12:00:00.000001 UTC\"
\tSource=\"capture.pcap\"
\tFilter=\"tcp\"
\tLogicGate=\"xor\"
\tLogicValue=90
-->
<rect x=\"0\" y=\"0\" width=\"1\" height=\"1\" style=\"fill:rgb(1,2,3)\" />
</svg>";

    #[test]
    fn parses_latest_header() {
        let mut lines = LATEST.lines();
        let header = parse_header(&mut lines).unwrap();
        assert_eq!(header.version, FormatVersion::V0_0_5);
        assert_eq!(header.dimensions, Dimensions::new(6, 2));
        assert_eq!(header.bits_per_pixel, BitsPerPixel::new(12).unwrap());
        assert_eq!(header.source.as_deref(), Some("capture.pcap"));
        assert_eq!(header.filter.as_deref(), Some("tcp"));
        assert_eq!(header.logic_gate, Some(LogicGate::Xor));
        assert_eq!(header.logic_value, Some(90));
        assert!(lines.next().unwrap().starts_with("<rect"));
    }

    #[test]
    fn parses_earliest_header() {
        let text = "<svg width=\"3\" height=\"1\">\n<!--\n\tgoNetViz \"0.0.3\"\n\tScale=2\n\tBitsPerPixel=1\n-->";
        let header = parse_header(&mut text.lines()).unwrap();
        assert_eq!(header.version, FormatVersion::V0_0_3);
        assert_eq!(header.scale, 2);
        assert_eq!(header.bits_per_pixel, BitsPerPixel::MONOCHROME);
        assert_eq!(header.timestamp, None);
        assert_eq!(header.logic_gate, None);
    }

    #[test]
    fn unknown_version_is_fatal() {
        let text = "<svg width=\"3\" height=\"1\">\n<!--\n\tnetviz \"0.0.9\"\n-->";
        assert_eq!(
            parse_header(&mut text.lines()),
            Err(ContainerError::UnknownVersion {
                found: "0.0.9".to_string()
            })
        );
    }

    #[test]
    fn missing_close_is_no_terminator() {
        let text = "<svg width=\"3\" height=\"1\">\n<!--\n\tnetviz \"0.0.3\"\n\tScale=1\n\tBitsPerPixel=24\n";
        assert_eq!(
            parse_header(&mut text.lines()),
            Err(ContainerError::NoTerminator {
                stage: HeaderStage::Fields
            })
        );
    }

    #[test]
    fn early_close_is_incomplete() {
        let text = "<svg width=\"3\" height=\"1\">\n<!--\n\tnetviz \"0.0.4\"\n\tScale=1\n\tBitsPerPixel=24\n-->";
        assert_eq!(
            parse_header(&mut text.lines()),
            Err(ContainerError::HeaderIncomplete {
                version: FormatVersion::V0_0_4,
                missing: HeaderField::Timestamp,
            })
        );
    }

    #[test]
    fn unrelated_lines_are_skipped() {
        let text = "junk\n<svg width=\"3\" height=\"1\">\nmore junk\n<!--\n\tnetviz \"0.0.3\"\n\tnote=1\n\tScale=1\n\tBitsPerPixel=3\n\tother\n-->";
        let header = parse_header(&mut text.lines()).unwrap();
        assert_eq!(header.bits_per_pixel.get(), 3);
    }

    #[test]
    fn fields_must_come_in_order() {
        // BitsPerPixel before Scale is skipped, so the header never completes.
        let text = "<svg width=\"3\" height=\"1\">\n<!--\n\tnetviz \"0.0.3\"\n\tBitsPerPixel=3\n\tScale=1\n-->";
        assert_eq!(
            parse_header(&mut text.lines()),
            Err(ContainerError::HeaderIncomplete {
                version: FormatVersion::V0_0_3,
                missing: HeaderField::BitsPerPixel,
            })
        );
    }

    #[test]
    fn invalid_field_is_fatal() {
        let text = "<svg width=\"3\" height=\"1\">\n<!--\n\tnetviz \"0.0.3\"\n\tScale=1\n\tBitsPerPixel=2\n-->";
        assert_eq!(
            parse_header(&mut text.lines()),
            Err(ContainerError::InvalidField {
                field: HeaderField::BitsPerPixel,
                value: "2".to_string(),
            })
        );
    }

    #[test]
    fn empty_input_reports_stage() {
        assert_eq!(
            parse_header(&mut std::iter::empty::<&str>()),
            Err(ContainerError::NoTerminator {
                stage: HeaderStage::Dimensions
            })
        );
    }

    #[test]
    fn feed_after_done_is_complete() {
        let mut parser = HeaderParser::new();
        for line in LATEST.lines().take(12) {
            parser.feed(line).unwrap();
        }
        assert_eq!(parser.stage(), HeaderStage::Done);
        assert_eq!(parser.lines_consumed(), 12);
        assert_eq!(parser.feed("anything").unwrap(), Progress::Complete);
        assert_eq!(parser.lines_consumed(), 12);
    }

    #[test]
    fn dimension_matcher() {
        assert_eq!(
            match_dimensions("<svg width=\"10\" height=\"4\">"),
            Some(Dimensions::new(10, 4))
        );
        assert_eq!(match_dimensions("<svg width=\"a\" height=\"4\">"), None);
        assert_eq!(match_dimensions("<svg width=\"10\" height=\"4\" >"), None);
    }

    #[test]
    fn version_tag_matcher() {
        assert_eq!(match_version_tag("\tnetviz \"0.0.5\""), Some("0.0.5"));
        assert_eq!(match_version_tag("\tnetviz \"v5\""), None);
        assert_eq!(match_version_tag("\tScale=1"), None);
    }
}
