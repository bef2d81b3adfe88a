use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use netviz_tools::{
    collect_entries, format_json, format_pretty, inspect_file, reconstruct, visualize,
    CancelToken, FileOutput, HeaderReport, PcapSink, PcapSource, Settings,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "netviz",
    version,
    about = "Turn network packets into pixels and back"
)]
struct Cli {
    /// TOML settings file; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render packets from a capture file into container images.
    Visualize {
        /// Capture file in classic pcap format.
        #[arg(long)]
        file: PathBuf,
        /// Capture filter, recorded in the image header.
        #[arg(long)]
        filter: Option<String>,
        /// Bits per pixel: 1, or a multiple of 3 up to 24.
        #[arg(long)]
        bits: Option<u32>,
        /// Number of packets to process; 0 removes the limit.
        #[arg(long)]
        count: Option<usize>,
        /// Number of packets per image.
        #[arg(long)]
        size: Option<usize>,
        /// Microseconds per image; each row is one microsecond.
        #[arg(long, alias = "timeslize")]
        timeslice: Option<u64>,
        /// Scaling factor for images.
        #[arg(long)]
        scale: Option<u32>,
        /// Maximum number of pixels per row.
        #[arg(long)]
        limit: Option<u32>,
        /// Prefix of the resulting images.
        #[arg(long)]
        prefix: Option<String>,
        /// Render to the terminal instead of writing images.
        #[arg(long)]
        terminal: bool,
        /// Logic gate applied to every payload byte.
        #[arg(long)]
        logic_gate: Option<String>,
        /// Operand of the logic gate (decimal, 0x.. or 0b..).
        #[arg(long)]
        logic_value: Option<String>,
        /// Directory the images are written to.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Rebuild a capture file from a container image.
    Reconstruct {
        /// Container image to read.
        #[arg(long)]
        file: PathBuf,
        /// Prefix of the resulting capture file.
        #[arg(long)]
        prefix: Option<String>,
        /// Directory the capture file is written to.
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Re-apply a recorded xor or not gate to restore the payloads.
        #[arg(long)]
        undo_logic: bool,
    },
    /// Print container headers.
    Inspect {
        /// Container image, or a directory of them.
        path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Limit the number of inspected images.
        #[arg(long)]
        limit: Option<usize>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = InspectFormat::Pretty)]
        format: InspectFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectFormat {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Visualize {
            file,
            filter,
            bits,
            count,
            size,
            timeslice,
            scale,
            limit,
            prefix,
            terminal,
            logic_gate,
            logic_value,
            output_dir,
        } => {
            override_with(&mut settings.filter, filter);
            override_with(&mut settings.bits, bits);
            override_with(&mut settings.count, count);
            override_with(&mut settings.packets_per_image, size);
            override_with(&mut settings.time_slice, timeslice);
            override_with(&mut settings.scale, scale);
            override_with(&mut settings.x_limit, limit);
            override_with(&mut settings.prefix, prefix);
            override_with(&mut settings.logic_gate, logic_gate);
            override_with(&mut settings.logic_operand, logic_value);
            override_with(&mut settings.output_dir, output_dir);
            settings.terminal |= terminal;
            run_visualize(&settings, &file)
        }
        Command::Reconstruct {
            file,
            prefix,
            output_dir,
            undo_logic,
        } => {
            override_with(&mut settings.prefix, prefix);
            override_with(&mut settings.output_dir, output_dir);
            run_reconstruct(&settings, &file, undo_logic)
        }
        Command::Inspect {
            path,
            glob,
            limit,
            format,
        } => run_inspect(&path, glob.as_deref(), limit, format),
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// A token that is cancelled by Ctrl-C.
fn interrupt_token() -> Result<CancelToken> {
    let cancel = CancelToken::new();
    cancel
        .cancel_on(tokio::signal::ctrl_c())
        .context("install interrupt handler")?;
    Ok(cancel)
}

fn run_visualize(settings: &Settings, file: &Path) -> Result<()> {
    let config = settings
        .visualize_config(&file.display().to_string())
        .context("invalid settings")?;
    let mut source = PcapSource::open(file, config.count)?;
    let mut output = FileOutput::new(&config.output_dir, BufWriter::new(io::stdout()));
    let summary = visualize(&mut source, &mut output, &config, &interrupt_token()?)?;
    info!(
        packets = summary.packets,
        outputs = summary.outputs,
        "done"
    );
    Ok(())
}

fn run_reconstruct(settings: &Settings, file: &Path, undo_logic: bool) -> Result<()> {
    let config = settings.reconstruct_config(undo_logic);
    let input = File::open(file).with_context(|| format!("open container {}", file.display()))?;
    let mut sink = PcapSink::create(&config.output_path())?;
    let summary = reconstruct(
        BufReader::new(input),
        &mut sink,
        &config,
        &interrupt_token()?,
    )?;
    info!(
        packets = summary.packets,
        path = %config.output_path().display(),
        "done"
    );
    Ok(())
}

fn run_inspect(
    path: &Path,
    glob: Option<&str>,
    limit: Option<usize>,
    format: InspectFormat,
) -> Result<()> {
    let mut reports: Vec<HeaderReport> = Vec::new();
    if path.is_dir() {
        let mut entries = collect_entries(path, glob)?;
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        for entry in entries {
            let report = inspect_file(&entry.path)?;
            if matches!(format, InspectFormat::Pretty) {
                println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                print!("{}", format_pretty(&report));
            }
            reports.push(report);
        }
    } else {
        let report = inspect_file(path)?;
        if matches!(format, InspectFormat::Pretty) {
            print!("{}", format_pretty(&report));
        }
        reports.push(report);
    }

    if matches!(format, InspectFormat::Json) {
        println!("{}", format_json(&reports)?);
    }
    Ok(())
}
