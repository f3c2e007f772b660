//! Null-hypothesis randomization draws
//!
//! One draw simulates the two variables being independent: each column is
//! given its own uniform permutation, destroying the observed pairing
//! while preserving both marginal distributions, and the conditional
//! ratio is recomputed on the synthetic pairing. Draws are i.i.d. under
//! the null, which is exactly what the convergence detector's percentile
//! estimation requires.
//!
//! The sampler is built once per (category pair, direction) evaluation.
//! It encodes the string columns into small integer codes up front so
//! that each draw clones and shuffles two flat `Vec<Option<u32>>` working
//! copies instead of string vectors; the shared dataset is never touched.
//! Seeding is per draw: a `ChaCha8` stream derived from the evaluation
//! seed plus the global draw index keeps batches reproducible under
//! `rayon`'s nondeterministic scheduling.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::dataset::CategoricalDataset;
use crate::ratio::{conditional_ratio, Direction};

/// Per-evaluation source of simulated conditional ratios.
#[derive(Debug, Clone)]
pub struct RandomizationSampler {
    codes_a: Vec<Option<u32>>,
    codes_b: Vec<Option<u32>>,
    independent: Option<u32>,
    dependent: Option<u32>,
    direction: Direction,
}

impl RandomizationSampler {
    /// Prepares encoded working material for one evaluation.
    ///
    /// `independent` and `dependent` are interpreted under `direction`:
    /// natural conditions on column A, reversed on column B. A label
    /// absent from its column encodes to a code matching nothing, so
    /// every draw is undefined — the detector handles that case.
    pub fn new(
        dataset: &CategoricalDataset,
        independent: &str,
        dependent: &str,
        direction: Direction,
    ) -> Self {
        let codes_a = encode(dataset.column_a(), dataset.categories_a());
        let codes_b = encode(dataset.column_b(), dataset.categories_b());
        let (independent, dependent) = match direction {
            Direction::Natural => (
                code_of(dataset.categories_a(), independent),
                code_of(dataset.categories_b(), dependent),
            ),
            Direction::Reversed => (
                code_of(dataset.categories_b(), independent),
                code_of(dataset.categories_a(), dependent),
            ),
        };
        Self {
            codes_a,
            codes_b,
            independent,
            dependent,
            direction,
        }
    }

    /// One simulated ratio from a fresh pair of independent shuffles.
    pub fn draw(&self, rng: &mut ChaCha8Rng) -> Option<f64> {
        let (independent, dependent) = (self.independent?, self.dependent?);

        let mut column_a = self.codes_a.clone();
        let mut column_b = self.codes_b.clone();
        column_a.shuffle(rng);
        column_b.shuffle(rng);

        conditional_ratio(&independent, &dependent, &column_a, &column_b, self.direction)
    }

    /// A batch of independent draws, computed in parallel.
    ///
    /// `offset` is the number of trials already consumed by this
    /// evaluation; it keeps successive batches on disjoint RNG streams.
    pub fn draw_batch(&self, base_seed: u64, offset: u64, batch_size: u64) -> Vec<Option<f64>> {
        (0..batch_size)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(offset + i));
                self.draw(&mut rng)
            })
            .collect()
    }
}

fn encode(column: &[Option<String>], categories: &[String]) -> Vec<Option<u32>> {
    column
        .iter()
        .map(|cell| {
            cell.as_deref()
                .and_then(|label| code_of(categories, label))
        })
        .collect()
}

fn code_of(categories: &[String], label: &str) -> Option<u32> {
    // Category sets are sorted, so binary search doubles as the code map.
    categories
        .binary_search_by(|c| c.as_str().cmp(label))
        .ok()
        .map(|i| i as u32)
}
