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

//! Theoretical curves drawn over the histogram.
//!
//! A curve is a sequence of `(x, pdf(x))` points. With [`CurveStrategy::Sampled`] the
//! x-coordinates are random draws from the distribution itself, sorted, so the points are dense
//! where the distribution has most of its mass. [`CurveStrategy::Uniform`] spaces them evenly.
//!
//! # Formulas
//!
//! The densities are the ones the plotting tool has always used, and are kept for
//! compatibility:
//!
//! - normal: `exp(-(x - mean)² / (2·std_dev)) / √(2π)`. Note that neither the normalizing
//!   factor nor the exponent uses `std_dev²`, so this is the textbook density only for
//!   `std_dev = 1`.
//! - exponential: `rate · exp(-rate·x)` for `x >= 0`.
//!
//! ```
//! use histofit::curve::{CurveGenerator, CurveStrategy};
//!
//! let mut generator = CurveGenerator::with_seed(100, CurveStrategy::Sampled, 17).unwrap();
//! let curve = generator.compute_normal(0.0, 1.0).unwrap();
//! assert_eq!(curve.len(), 100);
//! assert!(curve.xs().windows(2).all(|w| w[0] <= w[1]));
//! ```

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::sample::Draws;

/// Number of standard deviations on each side of the mean covered by a uniform normal curve.
const NORMAL_SPAN: f64 = 4.0;
/// Multiple of the mean `1/rate` covered by a uniform exponential curve.
const EXPONENTIAL_SPAN: f64 = 8.0;

/// The theoretical distributions that can be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    /// Normal distribution with a mean and a standard deviation.
    #[default]
    Normal,
    /// Exponential distribution with a rate.
    Exponential,
}

/// How the x-coordinates of a curve are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveStrategy {
    /// Sorted random draws from the distribution.
    #[default]
    Sampled,
    /// Evenly spaced over a fixed span: `mean ± 4·std_dev` for the normal distribution and
    /// `[0, 8/rate]` for the exponential one.
    Uniform,
}

/// Parameters of the normal curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalParameters {
    mean: f64,
    std_dev: f64,
}

impl NormalParameters {
    /// Validates and returns the parameters.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] if `mean` is not finite or `std_dev` is not finite and
    /// strictly positive.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(EngineError::InvalidParameter {
                name: "mean",
                value: mean,
                reason: "must be finite",
            });
        }
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(EngineError::non_positive("std_dev", std_dev));
        }
        Ok(Self { mean, std_dev })
    }

    /// Location of the curve.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Spread of the curve.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl Default for NormalParameters {
    /// `mean = 0`, `std_dev = 1`.
    fn default() -> Self {
        Self {
            mean: 0.0,
            std_dev: 1.0,
        }
    }
}

/// Parameters of the exponential curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialParameters {
    rate: f64,
}

impl ExponentialParameters {
    /// Validates and returns the parameters.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] if `rate` is not finite and strictly positive.
    pub fn new(rate: f64) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(EngineError::non_positive("rate", rate));
        }
        Ok(Self { rate })
    }

    /// Rate of the curve.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Default for ExponentialParameters {
    /// `rate = 1`.
    fn default() -> Self {
        Self { rate: 1.0 }
    }
}

/// Parameters of either curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveParameters {
    /// See [`NormalParameters`].
    Normal(NormalParameters),
    /// See [`ExponentialParameters`].
    Exponential(ExponentialParameters),
}

impl CurveParameters {
    /// The distribution these parameters belong to.
    #[must_use]
    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Normal(_) => DistributionKind::Normal,
            Self::Exponential(_) => DistributionKind::Exponential,
        }
    }

    /// Density at `x`.
    #[must_use]
    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            Self::Normal(p) => normal_pdf(x, p.mean, p.std_dev),
            Self::Exponential(p) => exponential_pdf(x, p.rate),
        }
    }
}

/// The normal density as drawn by the tool. See the [module documentation](self).
#[must_use]
pub fn normal_pdf(x: f64, mean: f64, std_dev: f64) -> f64 {
    let d = x - mean;
    (-(d * d) / (2.0 * std_dev)).exp() / (2.0 * PI).sqrt()
}

/// The exponential density, zero for negative `x`.
#[must_use]
pub fn exponential_pdf(x: f64, rate: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        rate * (-x * rate).exp()
    }
}

/// The points of one theoretical curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePoints {
    parameters: CurveParameters,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl CurvePoints {
    fn evaluate(parameters: CurveParameters, xs: Vec<f64>) -> Self {
        let ys = xs.iter().map(|&x| parameters.pdf(x)).collect();
        Self { parameters, xs, ys }
    }

    /// The parameters the curve was computed for.
    #[must_use]
    pub fn parameters(&self) -> CurveParameters {
        self.parameters
    }

    /// x-coordinates, in increasing order.
    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Densities at the matching x-coordinates.
    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Returns `true` if the curve has no points, which a [`CurveGenerator`] never produces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Iterator over `(x, y)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

/// Computes [`CurvePoints`] for the current parameters.
///
/// The generator owns the random number generator used by [`CurveStrategy::Sampled`], so two
/// generators built with the same seed produce the same sequence of curves.
#[derive(Debug, Clone)]
pub struct CurveGenerator {
    points: usize,
    strategy: CurveStrategy,
    rng: StdRng,
}

impl CurveGenerator {
    /// Constructs a generator seeded by the operating system.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] if `points` is zero.
    pub fn new(points: usize, strategy: CurveStrategy) -> Result<Self> {
        Self::with_rng(points, strategy, StdRng::from_entropy())
    }

    /// Constructs a generator whose curves are reproducible for the same `seed`.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] if `points` is zero.
    pub fn with_seed(points: usize, strategy: CurveStrategy, seed: u64) -> Result<Self> {
        Self::with_rng(points, strategy, StdRng::seed_from_u64(seed))
    }

    fn with_rng(points: usize, strategy: CurveStrategy, rng: StdRng) -> Result<Self> {
        if points == 0 {
            return Err(EngineError::InvalidParameter {
                name: "curve_points",
                value: 0.0,
                reason: "at least one point is required",
            });
        }
        Ok(Self {
            points,
            strategy,
            rng,
        })
    }

    /// Number of points in each curve.
    #[must_use]
    pub fn points(&self) -> usize {
        self.points
    }

    /// The x-coordinate strategy.
    #[must_use]
    pub fn strategy(&self) -> CurveStrategy {
        self.strategy
    }

    /// Computes the normal curve for `mean` and `std_dev`.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] if the parameters are rejected by
    /// [`NormalParameters::new`].
    pub fn compute_normal(&mut self, mean: f64, std_dev: f64) -> Result<CurvePoints> {
        self.generate(CurveParameters::Normal(NormalParameters::new(mean, std_dev)?))
    }

    /// Computes the exponential curve for `rate`.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] if `rate` is rejected by [`ExponentialParameters::new`].
    pub fn compute_exponential(&mut self, rate: f64) -> Result<CurvePoints> {
        self.generate(CurveParameters::Exponential(ExponentialParameters::new(
            rate,
        )?))
    }

    /// Computes the curve for already validated parameters.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] if the sampling distribution cannot be built.
    pub fn generate(&mut self, parameters: CurveParameters) -> Result<CurvePoints> {
        let xs = match self.strategy {
            CurveStrategy::Sampled => self.sampled_xs(parameters)?,
            CurveStrategy::Uniform => self.uniform_xs(parameters),
        };
        debug!(?parameters, points = xs.len(), "curve computed");
        Ok(CurvePoints::evaluate(parameters, xs))
    }

    fn sampled_xs(&mut self, parameters: CurveParameters) -> Result<Vec<f64>> {
        match parameters {
            CurveParameters::Normal(p) => {
                let distr = rand_distr::Normal::new(p.mean, p.std_dev)
                    .map_err(|_| EngineError::non_positive("std_dev", p.std_dev))?;
                Ok(self.sorted_draws(distr))
            }
            CurveParameters::Exponential(p) => {
                let distr = rand_distr::Exp::new(p.rate)
                    .map_err(|_| EngineError::non_positive("rate", p.rate))?;
                Ok(self.sorted_draws(distr))
            }
        }
    }

    fn sorted_draws<D: rand::distributions::Distribution<f64>>(&mut self, distr: D) -> Vec<f64> {
        match Draws::new(distr, self.points) {
            Some(mut draws) => {
                draws.fill_sorted(&mut self.rng);
                draws.into_values()
            }
            // `points` is checked at construction
            None => Vec::new(),
        }
    }

    fn uniform_xs(&self, parameters: CurveParameters) -> Vec<f64> {
        let (lo, hi) = match parameters {
            CurveParameters::Normal(p) => (
                p.mean - NORMAL_SPAN * p.std_dev,
                p.mean + NORMAL_SPAN * p.std_dev,
            ),
            CurveParameters::Exponential(p) => (0.0, EXPONENTIAL_SPAN / p.rate),
        };
        #[allow(clippy::cast_precision_loss)]
        let step = if self.points > 1 {
            (hi - lo) / (self.points - 1) as f64
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let xs = (0..self.points).map(|i| lo + step * i as f64).collect();
        xs
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn seeded(strategy: CurveStrategy) -> CurveGenerator {
        CurveGenerator::with_seed(100, strategy, 2024).unwrap()
    }

    #[test]
    fn normal_pdf_keeps_tool_formula() {
        let peak = 1.0 / (2.0 * PI).sqrt();
        assert!((normal_pdf(0.0, 0.0, 1.0) - peak).abs() < 1e-15);
        // Exponent divides by 2·std_dev, not 2·std_dev²: exp(-4 / 8)
        assert!((normal_pdf(2.0, 0.0, 4.0) - peak * (-0.5_f64).exp()).abs() < 1e-15);
        // No 1/std_dev factor in front
        assert!((normal_pdf(3.0, 3.0, 9.0) - peak).abs() < 1e-15);
    }

    #[test]
    fn exponential_pdf_values() {
        assert_eq!(exponential_pdf(0.0, 2.0), 2.0);
        assert!((exponential_pdf(1.0, 2.0) - 2.0 * (-2.0_f64).exp()).abs() < 1e-15);
        assert_eq!(exponential_pdf(-1.0, 2.0), 0.0);
    }

    #[test]
    fn sampled_normal_curve() {
        let curve = seeded(CurveStrategy::Sampled).compute_normal(1.5, 0.5).unwrap();
        assert_eq!(curve.len(), 100);
        assert!(curve.xs().windows(2).all(|w| w[0] <= w[1]));
        for (x, y) in curve.points() {
            assert_eq!(y, normal_pdf(x, 1.5, 0.5));
        }
        assert_eq!(curve.parameters().kind(), DistributionKind::Normal);
    }

    #[test]
    fn sampled_exponential_curve_is_non_negative() {
        let curve = seeded(CurveStrategy::Sampled).compute_exponential(3.0).unwrap();
        assert!(curve.xs().iter().all(|&x| x >= 0.0));
        assert!(curve.xs().windows(2).all(|w| w[0] <= w[1]));
        for (x, y) in curve.points() {
            assert_eq!(y, exponential_pdf(x, 3.0));
        }
    }

    #[test]
    fn same_seed_same_curves() {
        let first = seeded(CurveStrategy::Sampled).compute_normal(0.0, 1.0).unwrap();
        let second = seeded(CurveStrategy::Sampled).compute_normal(0.0, 1.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn consecutive_sampled_curves_differ() {
        let mut generator = seeded(CurveStrategy::Sampled);
        let first = generator.compute_normal(0.0, 1.0).unwrap();
        let second = generator.compute_normal(0.0, 1.0).unwrap();
        assert_ne!(first.xs(), second.xs());
    }

    #[test]
    fn uniform_normal_spans_four_deviations() {
        let curve = seeded(CurveStrategy::Uniform).compute_normal(10.0, 2.0).unwrap();
        assert_eq!(curve.xs()[0], 2.0);
        assert!((curve.xs()[99] - 18.0).abs() < 1e-12);
        let steps: Vec<f64> = curve.xs().windows(2).map(|w| w[1] - w[0]).collect();
        assert!(steps.iter().all(|s| (s - 16.0 / 99.0).abs() < 1e-12));
    }

    #[test]
    fn uniform_exponential_starts_at_zero() {
        let curve = seeded(CurveStrategy::Uniform).compute_exponential(0.5).unwrap();
        assert_eq!(curve.xs()[0], 0.0);
        assert_eq!(curve.ys()[0], 0.5);
        assert!((curve.xs()[99] - 16.0).abs() < 1e-12);
    }

    #[test]
    fn single_point_curve() {
        let mut generator = CurveGenerator::with_seed(1, CurveStrategy::Uniform, 0).unwrap();
        let curve = generator.compute_exponential(1.0).unwrap();
        assert_eq!(curve.xs(), &[0.0]);
    }

    #[test]
    fn rejects_non_positive_scale() {
        let mut generator = seeded(CurveStrategy::Sampled);
        for std_dev in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                generator.compute_normal(0.0, std_dev),
                Err(EngineError::InvalidParameter { name: "std_dev", .. })
            ));
        }
        assert!(matches!(
            generator.compute_exponential(0.0),
            Err(EngineError::InvalidParameter { name: "rate", .. })
        ));
        assert!(generator.compute_normal(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn rejects_zero_points() {
        assert!(CurveGenerator::new(0, CurveStrategy::Sampled).is_err());
    }

    #[test]
    fn defaults() {
        assert_eq!(NormalParameters::default(), NormalParameters::new(0.0, 1.0).unwrap());
        assert_eq!(ExponentialParameters::default().rate(), 1.0);
    }
}
