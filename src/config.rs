use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::analysis::classify::{DEFAULT_BASE, RoundingMode};
use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::data::model::TargetGrid;
use crate::data::writer::OutputFormat;

// ---------------------------------------------------------------------------
// Effective settings
// ---------------------------------------------------------------------------

/// Settings for the classify-raw stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyConfig {
    pub base: i64,
    pub rounding: RoundingMode,
    pub output_dir: PathBuf,
}

/// Settings for the extract-grid stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub targets: TargetGrid,
    pub output_dir: PathBuf,
}

/// Settings for the reclassify-extracted stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ReclassifyConfig {
    pub base: i64,
    pub rounding: RoundingMode,
    /// Folder (relative to the root) scanned for extracted files.
    pub input_dir: PathBuf,
    /// Stem suffix an extracted file must end with.
    pub suffix: String,
    pub output_dir: PathBuf,
}

/// Input discovery and output layout shared by all stages.
#[derive(Debug, Clone, PartialEq)]
pub struct IoConfig {
    /// Name prefix of the measurement-condition folders.
    pub folder_prefix: String,
    /// Input file extensions, lowercase, without the dot.
    pub extensions: Vec<String>,
    pub output_format: OutputFormat,
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub classify: ClassifyConfig,
    pub extract: ExtractConfig,
    pub reclassify: ReclassifyConfig,
    pub io: IoConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classify: ClassifyConfig {
                base: DEFAULT_BASE,
                rounding: RoundingMode::default(),
                output_dir: PathBuf::from("classified_frequencies"),
            },
            extract: ExtractConfig {
                targets: TargetGrid::default(),
                output_dir: PathBuf::from("extracted_frequencies"),
            },
            reclassify: ReclassifyConfig {
                base: DEFAULT_BASE,
                rounding: RoundingMode::default(),
                input_dir: PathBuf::from("extracted_frequencies"),
                suffix: "_magnitude".to_string(),
                output_dir: PathBuf::from("reclassified_frequencies"),
            },
            io: IoConfig {
                folder_prefix: "HL".to_string(),
                extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
                output_format: OutputFormat::default(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// TOML file (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    classify: ClassifySection,
    #[serde(default)]
    extract: ExtractSection,
    #[serde(default)]
    reclassify: ReclassifySection,
    #[serde(default)]
    io: IoSection,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ClassifySection {
    base: Option<i64>,
    rounding: Option<RoundingMode>,
    output_dir: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ExtractSection {
    start: Option<f64>,
    stop: Option<f64>,
    step: Option<f64>,
    /// Explicit grid; takes precedence over start/stop/step.
    targets: Option<Vec<f64>>,
    output_dir: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ReclassifySection {
    base: Option<i64>,
    rounding: Option<RoundingMode>,
    input_dir: Option<PathBuf>,
    suffix: Option<String>,
    output_dir: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct IoSection {
    folder_prefix: Option<String>,
    extensions: Option<Vec<String>>,
    output_format: Option<OutputFormat>,
}

/// Read a TOML file and merge it over the defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing TOML in {}", path.display()))
}

/// Parse TOML text and merge it over the defaults.
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = PipelineConfig::default();

    let c = file.classify;
    if let Some(v) = c.base {
        config.classify.base = v;
    }
    if let Some(v) = c.rounding {
        config.classify.rounding = v;
    }
    if let Some(v) = c.output_dir {
        config.classify.output_dir = v;
    }

    let e = file.extract;
    if let Some(v) = e.targets {
        config.extract.targets = TargetGrid::from_points(v);
    } else if e.start.is_some() || e.stop.is_some() || e.step.is_some() {
        config.extract.targets = TargetGrid::range(
            e.start.unwrap_or(TargetGrid::DEFAULT_START),
            e.stop.unwrap_or(TargetGrid::DEFAULT_STOP),
            e.step.unwrap_or(TargetGrid::DEFAULT_STEP),
        );
    }
    if let Some(v) = e.output_dir {
        config.extract.output_dir = v;
    }

    let r = file.reclassify;
    if let Some(v) = r.base {
        config.reclassify.base = v;
    }
    if let Some(v) = r.rounding {
        config.reclassify.rounding = v;
    }
    if let Some(v) = r.input_dir {
        config.reclassify.input_dir = v;
    }
    if let Some(v) = r.suffix {
        config.reclassify.suffix = v;
    }
    if let Some(v) = r.output_dir {
        config.reclassify.output_dir = v;
    }

    let io = file.io;
    if let Some(v) = io.folder_prefix {
        config.io.folder_prefix = v;
    }
    if let Some(v) = io.extensions {
        config.io.extensions = v
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
    }
    if let Some(v) = io.output_format {
        config.io.output_format = v;
    }

    config.validate()?;
    Ok(config)
}

impl PipelineConfig {
    /// Reject settings no stage can run with.
    pub fn validate(&self) -> Result<()> {
        if self.classify.base <= 0 {
            bail!("classify.base must be positive, got {}", self.classify.base);
        }
        if self.reclassify.base <= 0 {
            bail!("reclassify.base must be positive, got {}", self.reclassify.base);
        }
        if self.io.folder_prefix.is_empty() {
            bail!("io.folder_prefix must not be empty");
        }
        for ext in &self.io.extensions {
            if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                bail!("io.extensions: .{ext} is not a readable format");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.classify.base, 50);
        assert_eq!(config.extract.targets.len(), 440);
        assert_eq!(config.io.folder_prefix, "HL");
    }

    #[test]
    fn shipped_default_file_matches_defaults() {
        let config = parse_config(include_str!("../config/default.toml")).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            [classify]
            base = 100
            rounding = "half-even"

            [extract]
            start = 100
            stop = 1000
            step = 100

            [reclassify]
            base = 250
            suffix = "_grid"

            [io]
            folder_prefix = "Cond"
            extensions = [".CSV"]
            output_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.classify.base, 100);
        assert_eq!(config.classify.rounding, RoundingMode::HalfEven);
        assert_eq!(config.extract.targets.len(), 10);
        assert_eq!(config.reclassify.base, 250);
        assert_eq!(config.reclassify.rounding, RoundingMode::HalfAwayFromZero);
        assert_eq!(config.reclassify.suffix, "_grid");
        assert_eq!(config.io.folder_prefix, "Cond");
        assert_eq!(config.io.extensions, vec!["csv"]);
        assert_eq!(config.io.output_format, OutputFormat::Json);
    }

    #[test]
    fn explicit_targets_win_over_range() {
        let config = parse_config(
            r#"
            [extract]
            step = 10
            targets = [125.0, 250.0, 500.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.extract.targets.points(), &[125.0, 250.0, 500.0]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse_config("[classify]\nbase = 0\n").is_err());
        assert!(parse_config("[io]\nextensions = [\"xls\"]\n").is_err());
        assert!(parse_config("[classify]\nbsae = 50\n").is_err());
    }
}
