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

//! Contains [`FittingDistribution`] trait and its implementors.
//!
//! Fitting gives a starting point for the curve parameters that matches the loaded data,
//! instead of the fixed defaults.

use crate::curve::{ExponentialParameters, NormalParameters};
use crate::dataset::Dataset;
use crate::error::{EngineError, Result};

#[allow(clippy::module_name_repetitions)]
/// Curve parameters that can be estimated from a dataset.
pub trait FittingDistribution: Sized {
    /// Estimates `Self` from `dataset` by maximum likelihood.
    ///
    /// # Errors
    /// If the dataset admits no valid parameters for this distribution.
    fn fit(dataset: &Dataset) -> Result<Self>;
}

impl FittingDistribution for NormalParameters {
    /// Returns the mean and the population standard deviation of `dataset`.
    ///
    /// Fails with [`EngineError::DegenerateDataset`] if all samples are equal.
    fn fit(dataset: &Dataset) -> Result<Self> {
        if dataset.is_degenerate() {
            return Err(EngineError::DegenerateDataset);
        }
        NormalParameters::new(dataset.mean(), dataset.std_dev())
    }
}

impl FittingDistribution for ExponentialParameters {
    /// Returns the rate `1 / mean` of `dataset`.
    ///
    /// Fails with [`EngineError::InvalidParameter`] if the mean is not positive.
    fn fit(dataset: &Dataset) -> Result<Self> {
        let mean = dataset.mean();
        if mean <= 0.0 {
            return Err(EngineError::InvalidParameter {
                name: "mean",
                value: mean,
                reason: "an exponential fit needs a positive sample mean",
            });
        }
        ExponentialParameters::new(mean.recip())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_fit_uses_population_moments() {
        let dataset = Dataset::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let fitted = NormalParameters::fit(&dataset).unwrap();
        assert!((fitted.mean() - 2.5).abs() < 1e-12);
        assert!((fitted.std_dev() - 1.25_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn normal_fit_of_constant_data_fails() {
        let dataset = Dataset::new(vec![2.0; 5]).unwrap();
        assert!(matches!(
            NormalParameters::fit(&dataset),
            Err(EngineError::DegenerateDataset)
        ));
    }

    #[test]
    fn exponential_fit_is_reciprocal_mean() {
        let dataset = Dataset::new(vec![0.5, 1.5, 2.0, 4.0]).unwrap();
        let fitted = ExponentialParameters::fit(&dataset).unwrap();
        assert!((fitted.rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn normal_fit_of_huge_data_is_finite() {
        let dataset = Dataset::new(vec![-1e200, 0.0, 3e200]).unwrap();
        let fitted = NormalParameters::fit(&dataset).unwrap();
        assert!((fitted.mean() / 1e200 - 2.0 / 3.0).abs() < 1e-12);
        // population variance of (-1, 0, 3) is 26 / 9
        assert!((fitted.std_dev() / 1e200 - (26.0_f64 / 9.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn exponential_fit_needs_positive_mean() {
        let dataset = Dataset::new(vec![-3.0, 1.0]).unwrap();
        assert!(matches!(
            ExponentialParameters::fit(&dataset),
            Err(EngineError::InvalidParameter { name: "mean", .. })
        ));
    }
}
