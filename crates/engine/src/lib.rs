//! Shortfall engine and end-to-end pipeline for the TCA system.
//!
//! This crate combines the benchmark stages into per-order shortfall
//! records and exposes the pipeline entry points (typed records, raw
//! tabular rows, or a prebuilt quote book).

pub mod pipeline;
pub mod shortfall;

pub use pipeline::{TcaPipeline, TcaReport};
pub use shortfall::{DropCounts, DropReason, ShortfallEngine, shortfall_bps};
