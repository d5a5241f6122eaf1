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

//! Contains the [`Sample`] trait and the random draws the engine is built on.
//!
//! [`Draws`] is a reusable buffer of values drawn from a distribution. The theoretical curves
//! take their x-coordinates from sorted draws, and [`JarqueBeraSample`] uses unsorted draws to
//! simulate the Jarque-Bera statistic of normal data.

use rand::distributions::Distribution;
use rand_distr::StandardNormal;

use crate::dataset::moments;
use crate::normality::jarque_bera;

/// A dataset that can be regenerated at random and reduced to one statistic.
///
/// [`MonteCarlo`](crate::monte_carlo::MonteCarlo) calls [`Sample::generate`] and
/// [`Sample::evaluate`] once per iteration.
pub trait Sample {
    /// Replaces the dataset with a new random one.
    fn generate(&mut self, rng: &mut impl rand::Rng);

    /// Returns the statistic of the current dataset.
    fn evaluate(&self) -> f64;
}

/// A fixed number of values drawn from the distribution `D`.
#[derive(Debug, Clone)]
pub struct Draws<D> {
    distr: D,
    values: Box<[f64]>,
}

impl<D> Draws<D> {
    /// Returns a buffer for `count` draws from `distr`, or `None` if `count` is zero.
    pub fn new(distr: D, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let values = std::iter::repeat(0.0).take(count).collect();
        Some(Self { distr, values })
    }

    /// The current draws.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consumes the buffer and returns the current draws.
    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values.into_vec()
    }
}

impl<D> Draws<D>
where
    D: Distribution<f64>,
{
    /// Replaces every value with a fresh draw.
    pub fn fill(&mut self, rng: &mut impl rand::Rng) {
        self.values.fill_with(|| self.distr.sample(rng));
    }

    /// Replaces every value with a fresh draw and sorts the result in increasing order.
    pub fn fill_sorted(&mut self, rng: &mut impl rand::Rng) {
        self.fill(rng);
        self.values.sort_by(f64::total_cmp);
    }
}

/// Standard normal datasets of a fixed size, evaluated by their Jarque-Bera statistic.
///
/// The Jarque-Bera statistic does not depend on the location or scale of the data, so the
/// standard normal stands in for every normal distribution.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone)]
pub struct JarqueBeraSample {
    inner: Draws<StandardNormal>,
}

impl JarqueBeraSample {
    /// Returns a sample of `num_samples` values, or `None` if `num_samples` is zero.
    #[must_use]
    pub fn new(num_samples: usize) -> Option<Self> {
        Some(Self {
            inner: Draws::new(StandardNormal, num_samples)?,
        })
    }
}

impl Sample for JarqueBeraSample {
    fn generate(&mut self, rng: &mut impl rand::Rng) {
        self.inner.fill(rng);
    }

    fn evaluate(&self) -> f64 {
        let values = self.inner.values();
        let moments = moments(values);
        if moments.std_dev <= 0.0 {
            return 0.0;
        }
        jarque_bera(values.len(), moments.skewness, moments.kurtosis)
    }
}
