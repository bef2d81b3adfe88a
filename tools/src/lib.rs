//! Command-line front end for netviz.
//!
//! This crate wires the codec and container crates into runnable tools:
//!
//! - Visualize a packet capture as container images or terminal lines
//! - Reconstruct packets from a container into a capture file
//! - Inspect container headers
//!
//! # Design Principles
//!
//! - **Stages, not shared state** - Every pipeline stage owns its data and hands
//!   it on over a rendezvous channel.
//! - **First error wins** - One failing stage cancels the run and its error is
//!   what the caller sees.

pub mod capture;
pub mod config;
pub mod inspect;
pub mod layout;
pub mod output;
pub mod pcap;
pub mod pipeline;
pub mod render;
pub mod timefmt;

pub use capture::{
    CapturedPacket, MemorySink, MemorySource, PacketSink, PacketSource, PcapSink, PcapSource,
};
pub use config::{ConfigError, Layout, ReconstructConfig, Settings, VisualizeConfig};
pub use inspect::{
    collect_entries, format_json, format_pretty, inspect_file, inspect_reader, ContainerEntry,
    HeaderReport,
};
pub use layout::{Assembler, NamedImage, Rendered};
pub use output::{FileOutput, MemoryOutput, OutputSink};
pub use pipeline::{
    reconstruct, visualize, CancelToken, ReconstructSummary, VisualizeSummary,
};
pub use render::render_pair;
