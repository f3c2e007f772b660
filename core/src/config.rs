//! Test configuration value object
//!
//! All tunables of the randomization test travel together in one explicit
//! value passed to the runner at construction — nothing is read from
//! process-wide state. Validation happens once, up front, so the inner
//! loops can assume well-formed parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default ceiling on the per-batch trial count; unbounded doubling can
/// spin forever on degenerate inputs.
pub const DEFAULT_MAX_BATCH: u64 = 1 << 24;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("rand_level must lie strictly between 0 and 100, got {0}")]
    InvalidRandLevel(f64),

    #[error("converg_diff must be positive, got {0}")]
    InvalidConvergDiff(f64),

    #[error("iters_start must be at least 1")]
    InvalidItersStart,

    #[error("max_batch ({max_batch}) must not be below iters_start ({iters_start})")]
    MaxBatchBelowStart { max_batch: u64, iters_start: u64 },
}

/// Parameters governing one full permutation-test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Percentile of the null distribution used as the significance bar;
    /// e.g. 90.0 means an observed ratio is non-random when it exceeds
    /// 90% of randomized ratios.
    pub rand_level: f64,

    /// Relative stability threshold for convergence; e.g. 0.05 accepts an
    /// estimate once consecutive estimates differ by at most 5%.
    pub converg_diff: f64,

    /// Trial count of the first randomization batch.
    pub iters_start: u64,

    /// Hard ceiling on the batch size. An evaluation that still needs to
    /// grow past this is reported as non-converged with its best estimate
    /// instead of doubling forever.
    pub max_batch: u64,

    /// Master seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            rand_level: 90.0,
            converg_diff: 0.05,
            iters_start: 1000,
            max_batch: DEFAULT_MAX_BATCH,
            seed: None,
        }
    }
}

impl TestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rand_level.is_finite() || self.rand_level <= 0.0 || self.rand_level >= 100.0 {
            return Err(ConfigError::InvalidRandLevel(self.rand_level));
        }
        if !self.converg_diff.is_finite() || self.converg_diff <= 0.0 {
            return Err(ConfigError::InvalidConvergDiff(self.converg_diff));
        }
        if self.iters_start == 0 {
            return Err(ConfigError::InvalidItersStart);
        }
        if self.max_batch < self.iters_start {
            return Err(ConfigError::MaxBatchBelowStart {
                max_batch: self.max_batch,
                iters_start: self.iters_start,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(TestConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let cfg = TestConfig {
            rand_level: 100.0,
            ..TestConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidRandLevel(100.0)));

        let cfg = TestConfig {
            converg_diff: 0.0,
            ..TestConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidConvergDiff(0.0)));

        let cfg = TestConfig {
            iters_start: 0,
            ..TestConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidItersStart));

        let cfg = TestConfig {
            iters_start: 1000,
            max_batch: 10,
            ..TestConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MaxBatchBelowStart { .. })
        ));
    }
}
