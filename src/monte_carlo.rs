// Copyright 2024 Vladimir Kharchev

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Contains the [`MonteCarlo`] struct.
//!
//! The normality check compares its statistic with a flat threshold. [`MonteCarlo`] answers the
//! complementary question of how unusual an observed statistic is for data of the same size
//! that really is normal.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::sample::Sample;

/// Keeps track of the fraction of simulated values at least as large as the observed one.
struct TailRatio {
    /// Number of values `>=` the observed statistic
    upper: usize,
    /// Total number of values
    total: usize,
}

impl TailRatio {
    fn new() -> TailRatio {
        TailRatio { upper: 0, total: 0 }
    }

    fn update(&mut self, statistic: f64, observed: f64) {
        if statistic.total_cmp(&observed).is_ge() {
            self.upper += 1;
        }
        self.total += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn ratio(&self) -> f64 {
        self.upper as f64 / self.total as f64
    }
}

/// The state of a Monte-Carlo simulation.
///
/// [`MonteCarlo<S>`] repeatedly calls [`Sample::generate`] and [`Sample::evaluate`] methods of
/// `S` and summarizes the statistics returned by [`Sample::evaluate`].
pub struct MonteCarlo<S> {
    /// Number of iterations of the Monte-Carlo simulation.
    pub iterations: usize,
    sample: S,
    /// The random generator used by `sample.generate`
    rng: StdRng,
}

impl<S: Sample> MonteCarlo<S> {
    fn simulate_iteration(&mut self) -> f64 {
        self.sample.generate(&mut self.rng);
        self.sample.evaluate()
    }

    /// Runs the simulation and returns the fraction of iterations whose statistic is greater than
    /// or equal to `observed`, i.e. the upper-tail p-value of `observed`.
    ///
    /// Returns `NaN` if `self.iterations` is zero.
    pub fn simulate_pvalue(mut self, observed: f64) -> f64 {
        let mut ratio = TailRatio::new();
        for _ in 0..self.iterations {
            let statistic = self.simulate_iteration();
            ratio.update(statistic, observed);
        }
        ratio.ratio()
    }

    /// Runs the simulation and returns the sorted statistics.
    pub fn simulate(mut self) -> SimulatedStatistics {
        let statistics: Vec<f64> = (0..self.iterations)
            .map(|_| self.simulate_iteration())
            .collect();
        SimulatedStatistics::new(statistics)
    }
}

impl<S> MonteCarlo<S> {
    /// The default value of `self.iterations`
    pub const DEFAULT_ITERATIONS: usize = 10_000;

    /// Constructs a simulation whose generator is seeded by the operating system.
    pub fn new(sample: S) -> Self {
        Self {
            iterations: Self::DEFAULT_ITERATIONS,
            sample,
            rng: StdRng::from_entropy(),
        }
    }

    /// Constructs a simulation whose results are reproducible for the same `seed`.
    pub fn with_seed(sample: S, seed: u64) -> Self {
        Self {
            iterations: Self::DEFAULT_ITERATIONS,
            sample,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// The statistics generated by a Monte-Carlo simulation, in increasing order.
pub struct SimulatedStatistics {
    sorted: Vec<f64>,
}

impl SimulatedStatistics {
    fn new(mut sorted: Vec<f64>) -> Self {
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    /// Number of simulated statistics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Returns `true` if the simulation ran no iterations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Returns the `alpha` quantile, or `None` if there are no statistics or `alpha` is outside
    /// `[0, 1]`.
    #[must_use]
    pub fn quantile_of(&self, alpha: f64) -> Option<f64> {
        if self.sorted.is_empty() || !(0.0..=1.0).contains(&alpha) {
            return None;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let index = ((self.len() as f64 * alpha) as usize).min(self.len() - 1);
        Some(self.sorted[index])
    }
}
