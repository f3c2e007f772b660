//! Command-line front end for the categorical dependence permutation test
//!
//! Wires the external collaborators around the core engine: CSV input,
//! configuration from flags (optionally seeded from a JSON file), logged
//! progress, and the timestamped two-grid CSV report.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use thiserror::Error;

use catdep_core::{
    CategoricalDataset, ConfigError, DatasetError, LogProgress, PermTestError,
    PermutationTestRunner, TestConfig,
};

mod input;
mod report;

use input::ColumnSelector;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no column named {0:?} in the input header")]
    ColumnNotFound(String),

    #[error("column index {index} out of range for a {width}-column input")]
    ColumnOutOfRange { index: usize, width: usize },

    #[error("config file error: {0}")]
    ConfigFile(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Test(#[from] PermTestError),
}

/// Permutation test of dependence between two categorical variables.
#[derive(Parser, Debug)]
#[command(name = "catdep", version, about)]
struct Args {
    /// Input CSV file; first row is a header
    #[arg(long)]
    input: PathBuf,

    /// Output report path; a timestamp is inserted before the extension
    #[arg(long, default_value = "result.csv")]
    output: PathBuf,

    /// Independent-variable column, by header name or zero-based index
    #[arg(long = "independent-column", default_value = "1")]
    independent: ColumnSelector,

    /// Dependent-variable column, by header name or zero-based index
    #[arg(long = "dependent-column", default_value = "2")]
    dependent: ColumnSelector,

    /// Optional JSON file with a full test configuration; flags below
    /// override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Null-distribution percentile used as the significance bar
    #[arg(long)]
    rand_level: Option<f64>,

    /// Relative stability threshold for convergence
    #[arg(long)]
    converg_diff: Option<f64>,

    /// Trial count of the first randomization batch
    #[arg(long)]
    iters_start: Option<u64>,

    /// Ceiling on the per-batch trial count
    #[arg(long)]
    max_batch: Option<u64>,

    /// Master seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn test_config(&self) -> Result<TestConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_reader(File::open(path)?)?,
            None => TestConfig::default(),
        };
        if let Some(rand_level) = self.rand_level {
            config.rand_level = rand_level;
        }
        if let Some(converg_diff) = self.converg_diff {
            config.converg_diff = converg_diff;
        }
        if let Some(iters_start) = self.iters_start {
            config.iters_start = iters_start;
        }
        if let Some(max_batch) = self.max_batch {
            config.max_batch = max_batch;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(config)
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = args.test_config()?;
    let runner = PermutationTestRunner::new(config)?;

    let rows = input::read_observations(&args.input, &args.independent, &args.dependent)?;
    info!("loaded {} observation rows from {}", rows.len(), args.input.display());
    let dataset = CategoricalDataset::new(rows)?;
    info!(
        "{} independent and {} dependent categories; {} evaluations ahead",
        dataset.categories_a().len(),
        dataset.categories_b().len(),
        2 * dataset.categories_a().len() * dataset.categories_b().len()
    );

    let outcome = runner.run(&dataset, &LogProgress)?;

    let output = report::timestamped_path(&args.output);
    report::write_report(&output, &outcome, runner.config().rand_level)?;
    info!("report written to {}", output.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
