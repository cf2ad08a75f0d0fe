use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use hl_freq::analysis::classify::RoundingMode;
use hl_freq::data::writer::OutputFormat;

/// hl-freq: classify, extract and re-classify hearing-level measurements.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Experiment root holding the HL* condition folders.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Experiment identifier used in output names. Defaults to the root folder name.
    #[arg(long, global = true)]
    pub experiment: Option<String>,

    /// Output layout for result workbooks.
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "info", value_parser = parse_level)]
    pub log_level: log::LevelFilter,
}

fn parse_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("'{s}' is not one of off, error, warn, info, debug, trace"))
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Snap raw frequencies to multiples of the base and aggregate per bucket.
    Classify(BaseArgs),
    /// Extract magnitudes at the target frequency grid.
    Extract(GridArgs),
    /// Re-classify previously extracted grid files.
    Reclassify(BaseArgs),
    /// Run classify, extract and reclassify in sequence.
    All,
}

#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Base frequency in Hz.
    #[arg(long)]
    pub base: Option<i64>,

    /// Tie-break rule for frequencies exactly between two multiples.
    #[arg(long, value_enum)]
    pub rounding: Option<RoundingMode>,
}

#[derive(Args, Debug)]
pub struct GridArgs {
    /// First target frequency in Hz.
    #[arg(long)]
    pub start: Option<f64>,

    /// Last target frequency in Hz (inclusive).
    #[arg(long)]
    pub stop: Option<f64>,

    /// Grid spacing in Hz.
    #[arg(long)]
    pub step: Option<f64>,
}
