//! Core pipeline orchestration and domain logic for Vendorwatch.
//!
//! This crate ties together source collection, synthesis, delta computation,
//! and report rendering into the end-to-end intelligence run
//! ([`pipeline::run_pipeline`]).

pub mod collect;
pub mod delta;
pub mod pipeline;
pub mod render;
pub mod run;
pub mod sections;
pub mod synthesize;

#[cfg(test)]
pub(crate) mod testutil;

pub use pipeline::{ProgressReporter, SilentProgress, StageContext, run_pipeline};
pub use run::{DeltaResult, RawMaterial, RunOptions, RunRecord, RunRequest, Stage, Synthesis};
