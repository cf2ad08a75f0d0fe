//! Batch drivers for the three processing stages.
//!
//! ```text
//!   root/HL*/<subject>.csv ──► classify_raw ──► root/classified_frequencies/
//!                         └──► extract_grid ──► root/extracted_frequencies/
//!                                                      │
//!                               reclassify_extracted ◄─┘
//!                                      └──► root/reclassified_frequencies/
//! ```
//!
//! Each file is processed independently and yields its own `Result`; the
//! drivers collect them in a [`batch::BatchReport`] and keep going.

use std::path::PathBuf;

use crate::config::PipelineConfig;

use self::naming::OutputNamer;

pub mod batch;
pub mod discover;
pub mod naming;
pub mod stages;

/// Everything a stage needs, fixed once per run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Experiment root holding the condition folders and output folders.
    pub root: PathBuf,
    pub namer: OutputNamer,
    pub config: PipelineConfig,
}
