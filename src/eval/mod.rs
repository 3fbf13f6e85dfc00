//! Batch accumulation and report generation.
//!
//! This module provides the evaluation-run infrastructure:
//!
//! - [`accumulator::Accumulator`]: Per-batch ingestion and per-batch accuracy
//! - [`histogram`]: Label-keyed success/failure histograms
//! - [`report::Reporter`]: HTML rendering of the histograms
//! - [`summary::RunSummary`]: Per-class counts derived from the histograms

pub mod accumulator;
pub mod histogram;
pub mod report;
pub mod summary;

pub use accumulator::{Accumulator, AccumulatorConfig, BatchFn};
pub use histogram::{FailureHistogram, Histogram, Label, Mismatch, SuccessHistogram};
pub use report::{ReportConfig, Reporter};
pub use summary::{ClassSummary, Confusion, RunSummary};
