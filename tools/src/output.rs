//! Destinations for rendered images and terminal lines.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::layout::{NamedImage, Rendered};

/// Accepts finished output from the pipeline.
pub trait OutputSink {
    fn emit(&mut self, rendered: Rendered) -> Result<()>;

    /// Called once after the last item.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes images into a directory and terminal lines to a stream.
pub struct FileOutput<W: Write> {
    dir: PathBuf,
    terminal: W,
}

impl<W: Write> FileOutput<W> {
    pub fn new(dir: impl Into<PathBuf>, terminal: W) -> Self {
        Self {
            dir: dir.into(),
            terminal,
        }
    }

    fn write_image(&self, named: &NamedImage) -> Result<()> {
        let path = self.dir.join(&named.name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("create image {}", path.display()))?;
        let mut out = BufWriter::new(file);
        out.write_all(named.image.render().as_bytes())
            .and_then(|()| out.flush())
            .with_context(|| format!("write image {}", path.display()))?;
        info!(
            path = %path.display(),
            packets = named.image.packet_count(),
            "wrote image"
        );
        Ok(())
    }
}

impl<W: Write> OutputSink for FileOutput<W> {
    fn emit(&mut self, rendered: Rendered) -> Result<()> {
        match rendered {
            Rendered::Image(named) => self.write_image(&named),
            Rendered::TerminalLine(line) => {
                writeln!(self.terminal, "{line}").context("write terminal line")
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.terminal.flush().context("flush terminal")
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    pub images: Vec<NamedImage>,
    pub lines: Vec<String>,
}

impl OutputSink for MemoryOutput {
    fn emit(&mut self, rendered: Rendered) -> Result<()> {
        match rendered {
            Rendered::Image(named) => self.images.push(named),
            Rendered::TerminalLine(line) => self.lines.push(line),
        }
        Ok(())
    }
}
