use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .collect();
    paths.sort();
    Ok(paths)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Measurement-condition folders directly under `root` whose name starts
/// with `prefix`, sorted by name.
pub fn condition_folders(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(root)?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix))
        })
        .collect())
}

/// Readable files in `folder` with one of `extensions`, sorted by name.
pub fn input_files(folder: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(folder)?
        .into_iter()
        .filter(|p| p.is_file() && has_extension(p, extensions))
        .collect())
}

/// Files in `folder` whose stem ends with `suffix` (e.g. `_magnitude`).
pub fn extracted_files(folder: &Path, suffix: &str, extensions: &[String]) -> Result<Vec<PathBuf>> {
    Ok(input_files(folder, extensions)?
        .into_iter()
        .filter(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.ends_with(suffix))
        })
        .collect())
}
