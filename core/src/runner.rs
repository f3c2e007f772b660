//! Cross-product orchestration of permutation-test evaluations
//!
//! The runner is the only component aware of the full category
//! cross-product. For both role assignments and every (a ∈ A, b ∈ B)
//! pair it computes the observed conditional ratio, runs the convergence
//! detector against the randomized null, and records one result cell. A
//! pair is significant when its observed ratio strictly exceeds the
//! converged randomized threshold.
//!
//! Evaluations share only the read-only dataset, so they are dispatched
//! across the `rayon` pool; each carries a private sampler, convergence
//! state, and seed stream, and its cell is merged into the matrix only
//! after the evaluation fully completes.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeMap;

use log::warn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, TestConfig};
use crate::convergence::ConvergenceDetector;
use crate::dataset::{CategoricalDataset, DatasetError};
use crate::progress::ProgressObserver;
use crate::ratio::{conditional_ratio, Direction};
use crate::sampler::RandomizationSampler;

/// Errors that abort a run before any per-pair work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PermTestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// One cell of the result matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyCell {
    /// Conditional ratio measured on the real pairing. NaN if undefined.
    pub observed: f64,

    /// Converged high percentile of the randomized null ratios.
    pub randomized: f64,

    /// True iff `observed > randomized`, strictly.
    pub significant: bool,

    /// Carried from the detector; false marks a ceiling-terminated
    /// evaluation whose threshold is a best effort, not a converged one.
    pub converged: bool,
}

/// Complete outcome of a run: the dependency matrix keyed by
/// (independent label, dependent label), plus the category sets needed to
/// label report axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub matrix: BTreeMap<(String, String), DependencyCell>,
    pub categories_a: Vec<String>,
    pub categories_b: Vec<String>,
}

struct Evaluation<'d> {
    index: usize,
    direction: Direction,
    cat_a: &'d str,
    cat_b: &'d str,
    seed: u64,
}

/// Runs the full permutation test over a dataset.
#[derive(Debug, Clone)]
pub struct PermutationTestRunner {
    config: TestConfig,
}

impl PermutationTestRunner {
    pub fn new(config: TestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Evaluates every (category pair, direction) combination and
    /// assembles the result matrix.
    ///
    /// Matrix keys are (independent label, dependent label): natural
    /// evaluations write (a, b), reversed ones (b, a). When the two
    /// category sets intersect, a reversed evaluation may address a cell
    /// a natural one already wrote; the later evaluation wins.
    pub fn run(
        &self,
        dataset: &CategoricalDataset,
        observer: &dyn ProgressObserver,
    ) -> Result<TestOutcome, PermTestError> {
        let master_seed = self.config.seed.unwrap_or_else(rand::random);
        let mut seed_rng = ChaCha8Rng::seed_from_u64(master_seed);

        // Evaluation order fixed by the sorted category sets, so the
        // per-evaluation seeds are reproducible under a fixed master.
        let mut evaluations = Vec::new();
        for direction in Direction::BOTH {
            for cat_a in dataset.categories_a() {
                for cat_b in dataset.categories_b() {
                    evaluations.push(Evaluation {
                        index: evaluations.len(),
                        direction,
                        cat_a,
                        cat_b,
                        seed: seed_rng.gen(),
                    });
                }
            }
        }
        let total = evaluations.len();

        let cells: Vec<((String, String), DependencyCell)> = evaluations
            .par_iter()
            .map(|eval| self.evaluate(dataset, eval, total, observer))
            .collect();

        // Sequential merge in evaluation order keeps overwrites (on
        // intersecting category sets) deterministic.
        let mut matrix = BTreeMap::new();
        for (key, cell) in cells {
            matrix.insert(key, cell);
        }

        Ok(TestOutcome {
            matrix,
            categories_a: dataset.categories_a().to_vec(),
            categories_b: dataset.categories_b().to_vec(),
        })
    }

    fn evaluate(
        &self,
        dataset: &CategoricalDataset,
        eval: &Evaluation<'_>,
        total: usize,
        observer: &dyn ProgressObserver,
    ) -> ((String, String), DependencyCell) {
        // Role assignment under the current direction.
        let (independent, dependent) = match eval.direction {
            Direction::Natural => (eval.cat_a, eval.cat_b),
            Direction::Reversed => (eval.cat_b, eval.cat_a),
        };
        observer.evaluation_started(eval.index, total, independent, dependent, eval.direction);

        let observed = conditional_ratio(
            &independent.to_owned(),
            &dependent.to_owned(),
            dataset.column_a(),
            dataset.column_b(),
            eval.direction,
        )
        .unwrap_or(f64::NAN);

        let sampler = RandomizationSampler::new(dataset, independent, dependent, eval.direction);
        let detector = ConvergenceDetector::new(&self.config, eval.seed);
        let estimate = detector.estimate(&sampler, |batch_size| {
            observer.batch_started(eval.index, total, batch_size);
        });
        if !estimate.converged {
            warn!(
                "{} -> {} did not converge within max_batch {}; using best estimate {:.6}",
                independent, dependent, self.config.max_batch, estimate.value
            );
        }
        observer.evaluation_finished(eval.index, total, &estimate);

        let cell = DependencyCell {
            observed,
            randomized: estimate.value,
            significant: observed > estimate.value,
            converged: estimate.converged,
        };
        ((independent.to_owned(), dependent.to_owned()), cell)
    }
}
