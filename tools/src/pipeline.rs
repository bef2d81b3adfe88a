//! Staged pipelines connected by rendezvous channels.
//!
//! Every stage runs on its own scoped thread and hands items to the next one
//! over a zero-capacity channel, so a slow stage holds back the ones before
//! it. The first stage error trips the shared [`CancelToken`]; the source
//! stops, the remaining stages flush what they hold and exit, and that first
//! error is returned.

use std::future::Future;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ScopedJoinHandle};

use anyhow::{anyhow, bail, Context, Result};
use codec::LogicTransform;
use container::{BodyDecoder, ContainerHeader, HeaderParser, Progress};
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::capture::{CapturedPacket, PacketSink, PacketSource};
use crate::config::{ReconstructConfig, VisualizeConfig};
use crate::layout::{Assembler, Rendered};
use crate::output::OutputSink;

/// Cooperative cancellation shared by all stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancels once `signal` resolves successfully, e.g.
    /// `tokio::signal::ctrl_c()`. The signal is awaited on a watcher thread
    /// with its own single-threaded runtime.
    pub fn cancel_on<F>(&self, signal: F) -> io::Result<JoinHandle<()>>
    where
        F: Future<Output = io::Result<()>> + Send + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let token = self.clone();
        thread::Builder::new()
            .name("netviz-signal".to_string())
            .spawn(move || match runtime.block_on(signal) {
                Ok(()) => {
                    info!("interrupt received, stopping");
                    token.cancel();
                }
                Err(err) => warn!(error = %err, "signal watcher failed"),
            })
    }
}

/// Shared state of one pipeline run.
struct StageContext {
    cancel: CancelToken,
    first_error: Mutex<Option<anyhow::Error>>,
}

impl StageContext {
    fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            first_error: Mutex::new(None),
        }
    }

    /// Runs one stage body, recording its error instead of returning it.
    fn run<T: Default>(&self, stage: &'static str, body: impl FnOnce() -> Result<T>) -> T {
        debug!(stage, "stage started");
        match body() {
            Ok(value) => {
                debug!(stage, "stage finished");
                value
            }
            Err(err) => {
                error!(stage, error = %format!("{err:#}"), "stage failed");
                if let Ok(mut slot) = self.first_error.lock() {
                    if slot.is_none() {
                        *slot = Some(err);
                    }
                }
                self.cancel.cancel();
                T::default()
            }
        }
    }

    fn into_result(self) -> Result<()> {
        match self.first_error.into_inner() {
            Ok(None) => Ok(()),
            Ok(Some(err)) => Err(err),
            Err(_) => Err(anyhow!("pipeline error state poisoned")),
        }
    }
}

fn join<T>(handle: ScopedJoinHandle<'_, T>, stage: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("{stage} stage panicked"))
}

/// Outcome of a visualize run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualizeSummary {
    /// Packets read from the source.
    pub packets: usize,
    /// Images or terminal lines produced.
    pub outputs: usize,
}

/// Runs capture → transform → layout → output.
pub fn visualize<S, O>(
    source: &mut S,
    output: &mut O,
    config: &VisualizeConfig,
    cancel: &CancelToken,
) -> Result<VisualizeSummary>
where
    S: PacketSource + Send,
    O: OutputSink + Send,
{
    let ctx = StageContext::new(cancel.clone());
    let (captured_tx, captured_rx) = bounded::<CapturedPacket>(0);
    let (transformed_tx, transformed_rx) = bounded::<CapturedPacket>(0);
    let (rendered_tx, rendered_rx) = bounded::<Rendered>(0);
    let transform = config.transform;
    let assembler = Assembler::new(config.clone());

    info!(
        mode = %config.mode,
        layout = ?config.layout,
        transform = %transform,
        "visualize started"
    );
    let summary = thread::scope(|scope| -> Result<VisualizeSummary> {
        let ctx = &ctx;
        let capture = scope.spawn(move || {
            ctx.run("capture", || capture_stage(source, &captured_tx, &ctx.cancel))
        });
        let transformer = scope.spawn(move || {
            ctx.run("transform", || {
                transform_stage(&captured_rx, &transformed_tx, transform)
            })
        });
        let layout = scope.spawn(move || {
            ctx.run("layout", || layout_stage(&transformed_rx, &rendered_tx, assembler))
        });
        let sink = scope.spawn(move || ctx.run("output", || output_stage(&rendered_rx, output)));

        let packets = join(capture, "capture")?;
        join(transformer, "transform")?;
        join(layout, "layout")?;
        let outputs = join(sink, "output")?;
        Ok(VisualizeSummary { packets, outputs })
    })?;
    ctx.into_result()?;

    info!(
        packets = summary.packets,
        outputs = summary.outputs,
        "visualize finished"
    );
    Ok(summary)
}

fn capture_stage<S: PacketSource>(
    source: &mut S,
    tx: &Sender<CapturedPacket>,
    cancel: &CancelToken,
) -> Result<usize> {
    let mut count = 0;
    while !cancel.is_cancelled() {
        let Some(packet) = source.next_packet()? else {
            break;
        };
        if tx.send(packet).is_err() {
            break;
        }
        count += 1;
    }
    debug!(packets = count, "capture drained");
    Ok(count)
}

fn transform_stage(
    rx: &Receiver<CapturedPacket>,
    tx: &Sender<CapturedPacket>,
    transform: LogicTransform,
) -> Result<()> {
    for mut packet in rx {
        transform.apply_in_place(&mut packet.payload);
        if tx.send(packet).is_err() {
            break;
        }
    }
    Ok(())
}

fn layout_stage(
    rx: &Receiver<CapturedPacket>,
    tx: &Sender<Rendered>,
    mut assembler: Assembler,
) -> Result<()> {
    for packet in rx {
        if let Some(rendered) = assembler.push(packet) {
            if tx.send(rendered).is_err() {
                return Ok(());
            }
        }
    }
    if let Some(rendered) = assembler.finish() {
        // A closed channel means the output stage already failed.
        let _ = tx.send(rendered);
    }
    Ok(())
}

fn output_stage<O: OutputSink>(rx: &Receiver<Rendered>, output: &mut O) -> Result<usize> {
    let mut count = 0;
    for rendered in rx {
        output.emit(rendered)?;
        count += 1;
    }
    output.finish()?;
    Ok(count)
}

/// Outcome of a reconstruct run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconstructSummary {
    /// Header of the container, once it was parsed.
    pub header: Option<ContainerHeader>,
    /// Packets handed to the sink.
    pub packets: usize,
}

/// Runs container parse → packet sink.
pub fn reconstruct<R, K>(
    input: R,
    sink: &mut K,
    config: &ReconstructConfig,
    cancel: &CancelToken,
) -> Result<ReconstructSummary>
where
    R: BufRead + Send,
    K: PacketSink + Send,
{
    let ctx = StageContext::new(cancel.clone());
    let (packet_tx, packet_rx) = bounded::<Vec<u8>>(0);
    let undo_logic = config.undo_logic;

    let summary = thread::scope(|scope| -> Result<ReconstructSummary> {
        let ctx = &ctx;
        let parse = scope.spawn(move || {
            ctx.run("parse", || {
                parse_stage(input, &packet_tx, undo_logic, &ctx.cancel)
            })
        });
        let write = scope.spawn(move || ctx.run("sink", || sink_stage(&packet_rx, sink)));

        let header = join(parse, "parse")?;
        let packets = join(write, "sink")?;
        Ok(ReconstructSummary { header, packets })
    })?;
    ctx.into_result()?;

    info!(packets = summary.packets, "reconstruct finished");
    Ok(summary)
}

/// Picks the transform re-applied to decoded packets, if any.
fn undo_transform(header: &ContainerHeader, undo_logic: bool) -> Result<Option<LogicTransform>> {
    let recorded = header.logic();
    if !undo_logic || recorded.is_identity() {
        return Ok(None);
    }
    match recorded.inverse() {
        Some(inverse) => Ok(Some(inverse)),
        None => bail!("recorded logic gate {} destroys bits and cannot be undone", recorded.gate),
    }
}

fn parse_stage<R: BufRead>(
    input: R,
    tx: &Sender<Vec<u8>>,
    undo_logic: bool,
    cancel: &CancelToken,
) -> Result<Option<ContainerHeader>> {
    let mut lines = input.lines();
    let mut parser = HeaderParser::new();
    for line in lines.by_ref() {
        let line = line.context("read container")?;
        if parser.feed(&line)? == Progress::Complete {
            break;
        }
    }
    let header = parser.finish()?;
    info!(
        version = %header.version,
        bits = %header.bits_per_pixel,
        width = header.dimensions.width,
        height = header.dimensions.height,
        logic = %header.logic(),
        "parsed container header"
    );

    let undo = undo_transform(&header, undo_logic)?;
    let send = |mut packet: Vec<u8>| {
        if let Some(transform) = undo {
            transform.apply_in_place(&mut packet);
        }
        tx.send(packet).is_ok()
    };

    let mut body = BodyDecoder::new(&header);
    for line in lines {
        if cancel.is_cancelled() {
            return Ok(Some(header));
        }
        let line = line.context("read container")?;
        if let Some(packet) = body.feed(&line)? {
            if !send(packet) {
                return Ok(Some(header));
            }
        }
        if body.is_finished() {
            break;
        }
    }
    if let Some(packet) = body.finish() {
        let _ = send(packet);
    }
    Ok(Some(header))
}

fn sink_stage<K: PacketSink>(rx: &Receiver<Vec<u8>>, sink: &mut K) -> Result<usize> {
    let mut count = 0;
    for packet in rx {
        sink.append_packet(0, &packet)?;
        count += 1;
    }
    sink.finish()?;
    Ok(count)
}
