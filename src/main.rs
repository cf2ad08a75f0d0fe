mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{BaseArgs, Cli, Command, GridArgs};
use hl_freq::analysis::classify::RoundingMode;
use hl_freq::config::{PipelineConfig, load_config};
use hl_freq::data::model::TargetGrid;
use hl_freq::pipeline::batch::BatchReport;
use hl_freq::pipeline::naming::{OutputNamer, experiment_from_root};
use hl_freq::pipeline::{RunContext, stages};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .parse_default_env()
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(format) = cli.format {
        config.io.output_format = format;
    }
    match &cli.command {
        Command::Classify(args) => {
            apply_base(args, &mut config.classify.base, &mut config.classify.rounding)
        }
        Command::Reclassify(args) => {
            apply_base(args, &mut config.reclassify.base, &mut config.reclassify.rounding)
        }
        Command::Extract(args) => apply_grid(args, &mut config.extract.targets),
        Command::All => {}
    }
    config.validate().context("invalid configuration")?;

    let experiment = cli
        .experiment
        .clone()
        .unwrap_or_else(|| experiment_from_root(&cli.root));
    let ctx = RunContext {
        root: cli.root.clone(),
        namer: OutputNamer::new(experiment, chrono::Local::now().date_naive()),
        config,
    };
    log::info!(
        "Experiment '{}' in {}",
        ctx.namer.experiment,
        ctx.root.display()
    );

    let failed = match cli.command {
        Command::Classify(_) => summarize("classify", &stages::classify_raw(&ctx)),
        Command::Extract(_) => summarize("extract", &stages::extract_grid(&ctx)),
        Command::Reclassify(_) => summarize("reclassify", &stages::reclassify_extracted(&ctx)),
        Command::All => {
            summarize("classify", &stages::classify_raw(&ctx))
                + summarize("extract", &stages::extract_grid(&ctx))
                + summarize("reclassify", &stages::reclassify_extracted(&ctx))
        }
    };

    log::info!("All processing completed!");
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn apply_base(args: &BaseArgs, base: &mut i64, rounding: &mut RoundingMode) {
    if let Some(v) = args.base {
        *base = v;
    }
    if let Some(v) = args.rounding {
        *rounding = v;
    }
}

fn apply_grid(args: &GridArgs, targets: &mut TargetGrid) {
    if args.start.is_none() && args.stop.is_none() && args.step.is_none() {
        return;
    }
    *targets = TargetGrid::range(
        args.start.unwrap_or(TargetGrid::DEFAULT_START),
        args.stop.unwrap_or(TargetGrid::DEFAULT_STOP),
        args.step.unwrap_or(TargetGrid::DEFAULT_STEP),
    );
}

/// Log the stage summary and every failure; returns the failure count.
fn summarize<T>(stage: &str, report: &BatchReport<T>) -> usize {
    log::info!(
        "{stage}: {} of {} files processed",
        report.succeeded.len(),
        report.attempted()
    );
    for (path, err) in &report.failed {
        log::warn!("{stage}: {} failed: {err}", path.display());
    }
    report.failed.len()
}
