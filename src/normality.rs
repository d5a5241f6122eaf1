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

//! The Jarque-Bera normality check.
//!
//! The statistic is `JB = N/6 · (S² + (K - 3)²/4)` where `S` is the skewness and `K` the
//! kurtosis of the dataset. The dataset is classified as normal when `JB <` [`JB_THRESHOLD`].
//!
//! The flat threshold of 3 is a simplification kept for compatibility with the plotting tool:
//! the textbook test compares `JB` with a chi-squared quantile with two degrees of freedom
//! (5.99 at the 5% level). [`NormalityReport::chi_squared_p_value`] reports the textbook
//! p-value next to the verdict, and [`simulate_p_value`] estimates the exact p-value for small
//! samples, where the chi-squared approximation is poor.

use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{EngineError, Result};
use crate::monte_carlo::MonteCarlo;
use crate::sample::JarqueBeraSample;

/// A dataset is classified as normal when its Jarque-Bera statistic is below this value.
pub const JB_THRESHOLD: f64 = 3.0;

/// Returns the Jarque-Bera statistic of `n` samples with the given skewness and kurtosis.
///
/// `kurtosis` is the plain fourth standardized moment; 3 is subtracted here.
#[must_use]
pub fn jarque_bera(n: usize, skewness: f64, kurtosis: f64) -> f64 {
    let excess = kurtosis - 3.0;
    #[allow(clippy::cast_precision_loss)]
    let n = n as f64;
    n / 6.0 * (skewness * skewness + 0.25 * excess * excess)
}

/// Outcome of the normality check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalityReport {
    /// The Jarque-Bera statistic.
    pub statistic: f64,
    /// `statistic < JB_THRESHOLD`.
    pub is_normal: bool,
    /// Skewness the statistic was computed from.
    pub skewness: f64,
    /// Kurtosis the statistic was computed from.
    pub kurtosis: f64,
    /// `true` if the dataset had zero variance.
    pub degenerate: bool,
    /// Upper-tail probability of `statistic` under the chi-squared distribution with two degrees
    /// of freedom. Informational; the verdict does not use it.
    pub chi_squared_p_value: f64,
}

impl NormalityReport {
    /// Returns the report, or [`EngineError::DegenerateDataset`] if the dataset had zero
    /// variance.
    ///
    /// A constant dataset is reported as normal, because its skewness and kurtosis are defined
    /// as those of a normal distribution. Callers that would rather treat it as an error use
    /// this method.
    ///
    /// # Errors
    /// [`EngineError::DegenerateDataset`] if `self.degenerate`.
    pub fn require_variance(&self) -> Result<&Self> {
        if self.degenerate {
            Err(EngineError::DegenerateDataset)
        } else {
            Ok(self)
        }
    }
}

/// Runs the Jarque-Bera check on `dataset`.
///
/// ```
/// use histofit::dataset::Dataset;
/// use histofit::normality::test_normality;
///
/// let skewed = Dataset::new(vec![0.0; 20].into_iter().chain([50.0]).collect()).unwrap();
/// assert!(!test_normality(&skewed).is_normal);
/// ```
#[must_use]
pub fn test_normality(dataset: &Dataset) -> NormalityReport {
    let skewness = dataset.skewness();
    let kurtosis = dataset.kurtosis();
    let statistic = jarque_bera(dataset.len(), skewness, kurtosis);
    let report = NormalityReport {
        statistic,
        is_normal: statistic < JB_THRESHOLD,
        skewness,
        kurtosis,
        degenerate: dataset.is_degenerate(),
        chi_squared_p_value: chi_squared_p_value(statistic),
    };
    debug!(
        statistic,
        is_normal = report.is_normal,
        degenerate = report.degenerate,
        "normality checked"
    );
    report
}

/// Shorthand for `test_normality(dataset).is_normal`.
#[must_use]
pub fn is_normal(dataset: &Dataset) -> bool {
    test_normality(dataset).is_normal
}

fn chi_squared_p_value(statistic: f64) -> f64 {
    // Two degrees of freedom is always a valid chi-squared distribution.
    ChiSquared::new(2.0).map_or(f64::NAN, |chi| 1.0 - chi.cdf(statistic))
}

/// Estimates the probability that normal data of size `n` has a Jarque-Bera statistic of at
/// least `statistic`.
///
/// `seed` makes the estimate reproducible; `None` seeds from the operating system.
///
/// # Errors
/// [`EngineError::InvalidParameter`] if `n` or `iterations` is zero.
pub fn simulate_p_value(
    n: usize,
    statistic: f64,
    iterations: usize,
    seed: Option<u64>,
) -> Result<f64> {
    Ok(simulation(n, iterations, seed)?.simulate_pvalue(statistic))
}

/// Estimates the `1 - alpha` quantile of the Jarque-Bera statistic of normal data of size `n`,
/// i.e. the threshold a test at significance level `alpha` would use.
///
/// # Errors
/// [`EngineError::InvalidParameter`] if `n` or `iterations` is zero or `alpha` is outside
/// `[0, 1]`.
pub fn simulate_critical_value(
    n: usize,
    alpha: f64,
    iterations: usize,
    seed: Option<u64>,
) -> Result<f64> {
    simulation(n, iterations, seed)?
        .simulate()
        .quantile_of(1.0 - alpha)
        .ok_or(EngineError::InvalidParameter {
            name: "alpha",
            value: alpha,
            reason: "must lie in [0, 1]",
        })
}

fn simulation(
    n: usize,
    iterations: usize,
    seed: Option<u64>,
) -> Result<MonteCarlo<JarqueBeraSample>> {
    #[allow(clippy::cast_precision_loss)]
    let sample = JarqueBeraSample::new(n).ok_or(EngineError::InvalidParameter {
        name: "n",
        value: n as f64,
        reason: "at least one sample is required",
    })?;
    if iterations == 0 {
        return Err(EngineError::InvalidParameter {
            name: "iterations",
            value: 0.0,
            reason: "at least one iteration is required",
        });
    }
    let mut simulation = match seed {
        Some(seed) => MonteCarlo::with_seed(sample, seed),
        None => MonteCarlo::new(sample),
    };
    simulation.iterations = iterations;
    Ok(simulation)
}
