use std::path::{Path, PathBuf};

use crate::analysis::aggregate::aggregate;
use crate::analysis::classify::{RoundingMode, classify_dataset};
use crate::analysis::columns::{ColumnRoles, resolve};
use crate::analysis::extract::extract;
use crate::data::loader::load_table;
use crate::data::model::{ClassifiedRow, Dataset, ExtractedRow, GroupedResult};
use crate::data::table::{CellValue, Table, Workbook};
use crate::data::writer::write_workbook;
use crate::error::{Error, Result};

use super::RunContext;
use super::batch::{BatchReport, run_batch};
use super::discover;

pub const DETAILED_SHEET: &str = "Detailed_Results";
pub const GROUPED_SHEET: &str = "Grouped_Results";
pub const EXTRACTED_SHEET: &str = "Extracted_Results";

/// Result of classifying one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyOutcome {
    pub groups: GroupedResult,
    pub outputs: Vec<PathBuf>,
}

/// Result of extracting the target grid from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOutcome {
    pub rows: Vec<ExtractedRow>,
    pub outputs: Vec<PathBuf>,
}

/// How the frequency / magnitude columns of an input are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnPolicy {
    Sniff,
    Positional,
}

// ---------------------------------------------------------------------------
// Per-file processing
// ---------------------------------------------------------------------------

fn load_dataset(path: &Path, policy: ColumnPolicy) -> Result<Dataset> {
    let table = load_table(path).map_err(|e| Error::io(path, &e))?;
    let roles = match policy {
        ColumnPolicy::Positional => {
            if table.headers.len() < 2 {
                return Err(Error::InsufficientColumns {
                    found: table.headers.len(),
                });
            }
            ColumnRoles::positional()
        }
        ColumnPolicy::Sniff => {
            let roles = resolve(&table.headers)?;
            if roles.frequency_fallback {
                log::warn!(
                    "Assuming first column '{}' contains frequencies",
                    table.headers[roles.frequency]
                );
            }
            if roles.magnitude_fallback {
                log::warn!(
                    "Assuming second column '{}' contains magnitude values",
                    table.headers[roles.magnitude]
                );
            }
            roles
        }
    };
    Dataset::from_table(&table, &roles)
}

fn classified_workbook(rows: &[ClassifiedRow], groups: &GroupedResult) -> Workbook {
    let mut detailed = Table::new(vec![
        "Original_Frequency".into(),
        "Classified_Frequency".into(),
        "Magnitude".into(),
    ]);
    detailed.rows = rows
        .iter()
        .map(|r| {
            vec![
                CellValue::from(r.original_frequency),
                CellValue::from(r.classified_frequency),
                CellValue::from(r.magnitude),
            ]
        })
        .collect();

    let mut grouped = Table::new(vec![
        "Classified_Frequency".into(),
        "Mean_Magnitude".into(),
        "Count".into(),
    ]);
    grouped.rows = groups
        .iter()
        .map(|(freq, stats)| {
            vec![
                CellValue::from(freq),
                CellValue::from(stats.mean_magnitude),
                CellValue::from(stats.count),
            ]
        })
        .collect();

    Workbook::default()
        .with_sheet(DETAILED_SHEET, detailed)
        .with_sheet(GROUPED_SHEET, grouped)
}

fn classify_and_write(
    ctx: &RunContext,
    path: &Path,
    dataset: &Dataset,
    base: i64,
    rounding: RoundingMode,
    output_dir: &Path,
    stem: &str,
) -> Result<ClassifyOutcome> {
    let rows = classify_dataset(dataset, base, rounding)?;
    let groups = aggregate(&rows)?;

    let dir = ctx.root.join(output_dir);
    let outputs = write_workbook(
        &dir,
        stem,
        &classified_workbook(&rows, &groups),
        ctx.config.io.output_format,
    )
    .map_err(|e| Error::io(&dir, &e))?;

    log::info!(
        "{}: {} unique {base}Hz frequency groups",
        path.display(),
        groups.len()
    );
    if let Some((lo, hi)) = groups.frequency_range() {
        log::debug!("Frequency range: {lo}Hz - {hi}Hz");
    }
    for out in &outputs {
        log::info!("Results saved to {}", out.display());
    }
    Ok(ClassifyOutcome { groups, outputs })
}

/// Classify one raw measurement file and write its detailed / grouped sheets.
pub fn classify_file(ctx: &RunContext, path: &Path) -> Result<ClassifyOutcome> {
    let cfg = &ctx.config.classify;
    let dataset = load_dataset(path, ColumnPolicy::Sniff)?;
    let stem = ctx.namer.classified(path, cfg.base);
    classify_and_write(ctx, path, &dataset, cfg.base, cfg.rounding, &cfg.output_dir, &stem)
}

/// Extract the configured target grid from one raw measurement file.
///
/// The output keeps the source's frequency / magnitude headers as its first
/// two columns, so the reclassify stage can read it positionally.
pub fn extract_file(ctx: &RunContext, path: &Path) -> Result<ExtractOutcome> {
    let cfg = &ctx.config.extract;
    let dataset = load_dataset(path, ColumnPolicy::Sniff)?;
    let rows = extract(&dataset, cfg.targets.points())?;

    let mut table = Table::new(vec![
        dataset.frequency_column.clone(),
        dataset.magnitude_column.clone(),
        "Target_Frequency".into(),
    ]);
    table.rows = rows
        .iter()
        .map(|r| {
            vec![
                CellValue::from(r.actual_frequency),
                CellValue::from(r.magnitude),
                CellValue::from(r.target_frequency),
            ]
        })
        .collect();
    let workbook = Workbook::default().with_sheet(EXTRACTED_SHEET, table);

    let dir = ctx.root.join(&cfg.output_dir);
    let outputs = write_workbook(
        &dir,
        &ctx.namer.extracted(path),
        &workbook,
        ctx.config.io.output_format,
    )
    .map_err(|e| Error::io(&dir, &e))?;

    for out in &outputs {
        log::info!("Results saved to {}", out.display());
    }
    Ok(ExtractOutcome { rows, outputs })
}

/// Re-classify one extracted grid file (first column frequency, second
/// magnitude) with the reclassify base.
pub fn reclassify_file(ctx: &RunContext, path: &Path) -> Result<ClassifyOutcome> {
    let cfg = &ctx.config.reclassify;
    let dataset = load_dataset(path, ColumnPolicy::Positional)?;
    let stem = ctx
        .namer
        .reclassified(path, &ctx.config.io.folder_prefix, cfg.base);
    classify_and_write(ctx, path, &dataset, cfg.base, cfg.rounding, &cfg.output_dir, &stem)
}

// ---------------------------------------------------------------------------
// Batch drivers
// ---------------------------------------------------------------------------

/// Run `process` over every input file of every condition folder.
fn over_condition_folders<T>(
    ctx: &RunContext,
    process: impl Fn(&RunContext, &Path) -> Result<T>,
) -> BatchReport<T> {
    let mut report = BatchReport::default();
    let prefix = &ctx.config.io.folder_prefix;

    let folders = match discover::condition_folders(&ctx.root, prefix) {
        Ok(folders) => folders,
        Err(e) => {
            report.record_failure(ctx.root.clone(), Error::io(&ctx.root, &e));
            return report;
        }
    };
    if folders.is_empty() {
        log::warn!("No {prefix} folders found in {}", ctx.root.display());
        return report;
    }
    log::info!("Found {} {prefix} folders", folders.len());

    for folder in &folders {
        log::info!("Processing folder {}", folder.display());
        match discover::input_files(folder, &ctx.config.io.extensions) {
            Ok(files) => report.merge(run_batch(&files, |path| process(ctx, path))),
            Err(e) => report.record_failure(folder.clone(), Error::io(folder, &e)),
        }
    }
    report
}

/// Stage (a): classify every raw file in every condition folder.
pub fn classify_raw(ctx: &RunContext) -> BatchReport<ClassifyOutcome> {
    log::info!(
        "Using {}Hz as base frequency for classification",
        ctx.config.classify.base
    );
    over_condition_folders(ctx, classify_file)
}

/// Stage (b): extract the target grid from every raw file.
pub fn extract_grid(ctx: &RunContext) -> BatchReport<ExtractOutcome> {
    log::info!(
        "Extracting {} target frequencies",
        ctx.config.extract.targets.len()
    );
    over_condition_folders(ctx, extract_file)
}

/// Stage (c): re-classify every extracted file.
pub fn reclassify_extracted(ctx: &RunContext) -> BatchReport<ClassifyOutcome> {
    let cfg = &ctx.config.reclassify;
    let dir = ctx.root.join(&cfg.input_dir);
    let mut report = BatchReport::default();

    let files = match discover::extracted_files(&dir, &cfg.suffix, &ctx.config.io.extensions) {
        Ok(files) => files,
        Err(e) => {
            report.record_failure(dir.clone(), Error::io(&dir, &e));
            return report;
        }
    };
    if files.is_empty() {
        log::warn!(
            "No files with suffix '{}' found in {}",
            cfg.suffix,
            dir.display()
        );
        return report;
    }
    log::info!(
        "Found {} files to re-classify with {}Hz base",
        files.len(),
        cfg.base
    );
    report.merge(run_batch(&files, |path| reclassify_file(ctx, path)));
    report
}
