//! Core engine of the Categorical Dependence Observatory
//!
//! This crate implements a randomization (permutation) test of dependence
//! between two categorical variables observed pairwise. For every pair of
//! category values, the observed conditional occurrence ratio is compared
//! against a high percentile of the ratio's null distribution, which is
//! built empirically by repeatedly destroying the pairing between the two
//! variables through independent column shuffles.
//!
//! The centerpiece is the adaptive Monte Carlo convergence detector in
//! [`convergence`]: rather than running a fixed number of permutations, it
//! grows the trial batch geometrically and accepts a percentile estimate
//! only after stability has been reconfirmed at a doubled sample size,
//! guarding against coincidental short-run plateaus.
//!
//! # Architecture
//!
//! Data flows strictly downward through five layers:
//!
//! 1. [`dataset`] — paired observations and derived category sets
//! 2. [`ratio`] — pure conditional-ratio computation
//! 3. [`sampler`] — one simulated ratio per independent double-shuffle
//! 4. [`convergence`] — adaptive batch-doubling percentile stabilization
//! 5. [`runner`] — cross-product orchestration into a result matrix
//!
//! Evaluations share only the read-only dataset and are executed in
//! parallel with `rayon`; determinism under a fixed seed is preserved by
//! deriving an independent `ChaCha8` stream per permutation draw.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod config;
pub mod convergence;
pub mod dataset;
pub mod progress;
pub mod ratio;
pub mod runner;
pub mod sampler;
pub mod stats;

pub use config::{ConfigError, TestConfig};
pub use convergence::{ConvergenceDetector, ThresholdEstimate};
pub use dataset::{CategoricalDataset, ColumnRole, DatasetError, ObservationPair};
pub use progress::{LogProgress, NoopProgress, ProgressObserver};
pub use ratio::{conditional_ratio, Direction};
pub use runner::{DependencyCell, PermTestError, PermutationTestRunner, TestOutcome};
pub use sampler::RandomizationSampler;
