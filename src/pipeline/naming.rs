use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Builds output file stems from the run identity.
///
/// Every stem starts with `{experiment}_{YYYYMMDD}`; the experiment id and
/// the date are fixed once per run and passed in, never read mid-pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNamer {
    pub experiment: String,
    pub date: NaiveDate,
}

impl OutputNamer {
    pub fn new(experiment: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            experiment: experiment.into(),
            date,
        }
    }

    fn prefix(&self) -> String {
        format!("{}_{}", self.experiment, self.date.format("%Y%m%d"))
    }

    /// `{exp}_{date}_{folder}_{stem}_freq{base}`
    pub fn classified(&self, input: &Path, base: i64) -> String {
        format!("{}_{}_{}_freq{base}", self.prefix(), folder_name(input), file_stem(input))
    }

    /// `{exp}_{date}_{folder}_{stem}_magnitude`
    pub fn extracted(&self, input: &Path) -> String {
        format!("{}_{}_{}_magnitude", self.prefix(), folder_name(input), file_stem(input))
    }

    /// `{exp}_{date}_{condition}_{stem}_reclass{base}`, where `condition` is
    /// the first `_`-separated part of the stem starting with `folder_prefix`.
    pub fn reclassified(&self, input: &Path, folder_prefix: &str, base: i64) -> String {
        let stem = file_stem(input);
        let condition = stem
            .split('_')
            .find(|part| part.starts_with(folder_prefix))
            .unwrap_or("");
        format!("{}_{condition}_{stem}_reclass{base}", self.prefix())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn folder_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Experiment identifier derived from the root directory's own name.
pub fn experiment_from_root(root: &Path) -> String {
    let resolved: PathBuf = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    resolved
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "experiment".to_string())
}
