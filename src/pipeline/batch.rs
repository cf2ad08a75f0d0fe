use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Per-file results of one batch run.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub succeeded: Vec<(PathBuf, T)>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Fold another report (e.g. from the next folder) into this one.
    pub fn merge(&mut self, other: BatchReport<T>) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }

    /// Record a failure that happened before any file could be attempted.
    pub fn record_failure(&mut self, path: PathBuf, err: Error) {
        log::error!("Error processing {}: {err}", path.display());
        self.failed.push((path, err));
    }
}

/// Run `process` on every file; a failing file is logged and skipped.
pub fn run_batch<T, F>(files: &[PathBuf], mut process: F) -> BatchReport<T>
where
    F: FnMut(&Path) -> Result<T>,
{
    let mut report = BatchReport::default();
    let total = files.len();
    for (i, path) in files.iter().enumerate() {
        log::info!("[{}/{total}] Processing {}", i + 1, path.display());
        match process(path) {
            Ok(value) => {
                log::info!("Successfully processed {}", path.display());
                report.succeeded.push((path.clone(), value));
            }
            Err(err) => report.record_failure(path.clone(), err),
        }
    }
    log::info!(
        "{} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_file_does_not_stop_the_batch() {
        let files: Vec<PathBuf> = ["one.csv", "two.csv", "three.csv"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let mut attempted = Vec::new();
        let report = run_batch(&files, |path| {
            attempted.push(path.to_path_buf());
            if path == Path::new("two.csv") {
                Err(Error::Io {
                    path: path.to_path_buf(),
                    message: "unreadable".into(),
                })
            } else {
                Ok(path.to_string_lossy().len())
            }
        });

        assert_eq!(attempted, files);
        assert_eq!(report.attempted(), 3);
        let ok: Vec<_> = report.succeeded.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(ok, vec![PathBuf::from("one.csv"), PathBuf::from("three.csv")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, PathBuf::from("two.csv"));
        assert!(matches!(report.failed[0].1, Error::Io { .. }));
    }

    #[test]
    fn merge_accumulates_reports() {
        let mut total: BatchReport<u8> = BatchReport::default();
        let mut other = BatchReport::default();
        other.succeeded.push((PathBuf::from("a"), 1));
        other.record_failure(PathBuf::from("b"), Error::EmptyInput);
        total.merge(other);
        assert_eq!(total.attempted(), 2);
    }
}
