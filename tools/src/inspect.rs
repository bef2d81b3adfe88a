//! Header reports for container files.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use container::{HeaderParser, Progress};
use glob::Pattern;
use serde::Serialize;

/// What a container header says about its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderReport {
    pub path: PathBuf,
    pub version: String,
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub bits_per_pixel: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logic_gate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logic_value: Option<u8>,
}

/// A file picked up when inspecting a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Reads the header of the container at `path`. The body is not touched.
pub fn inspect_file(path: &Path) -> Result<HeaderReport> {
    let file = File::open(path).with_context(|| format!("open container {}", path.display()))?;
    inspect_reader(path, BufReader::new(file))
}

/// Reads a header from any line source, reporting it under `path`.
pub fn inspect_reader<R: BufRead>(path: &Path, reader: R) -> Result<HeaderReport> {
    let mut parser = HeaderParser::new();
    for line in reader.lines() {
        let line = line.with_context(|| format!("read container {}", path.display()))?;
        let progress = parser
            .feed(&line)
            .with_context(|| format!("parse header {}", path.display()))?;
        if progress == Progress::Complete {
            break;
        }
    }
    let header = parser
        .finish()
        .with_context(|| format!("parse header {}", path.display()))?;
    Ok(HeaderReport {
        path: path.to_path_buf(),
        version: header.version.to_string(),
        width: header.dimensions.width,
        height: header.dimensions.height,
        scale: header.scale,
        bits_per_pixel: header.bits_per_pixel.get(),
        timestamp: header.timestamp,
        source: header.source,
        filter: header.filter,
        logic_gate: header.logic_gate.map(|gate| gate.to_string()),
        logic_value: header.logic_value,
    })
}

/// Lists the files in `dir`, optionally filtered by a glob on the path or
/// file name, sorted by path.
pub fn collect_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<ContainerEntry>> {
    let pattern = glob
        .map(|value| Pattern::new(value).context("invalid glob pattern"))
        .transpose()?;

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(ContainerEntry { path, size });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Formats a report for people.
#[must_use]
pub fn format_pretty(report: &HeaderReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "version: {}", report.version);
    let _ = writeln!(out, "size: {}x{}", report.width, report.height);
    let _ = writeln!(out, "scale: {}", report.scale);
    let _ = writeln!(out, "bits per pixel: {}", report.bits_per_pixel);
    let optional = [
        ("captured", report.timestamp.as_deref()),
        ("source", report.source.as_deref()),
        ("filter", report.filter.as_deref()),
        ("logic gate", report.logic_gate.as_deref()),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    if let Some(value) = report.logic_value {
        let _ = writeln!(out, "logic value: {value}");
    }
    out
}

/// Formats reports as a JSON array.
pub fn format_json(reports: &[HeaderReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).context("serialize json")
}
