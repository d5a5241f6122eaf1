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

//! Contains [`Session`], the state that user actions act on.
//!
//! A session starts without data. The first successful load moves it to the loaded state, and
//! every later action keeps it there. Each action recomputes only what depends on what it
//! changed:
//!
//! | action | recomputes |
//! |--------|------------|
//! | load | dataset, histogram, both curves, normality |
//! | [`Session::set_bin_count`] | histogram |
//! | [`Session::adjust_parameter`] | the active curve, normality |
//! | [`Session::fit_parameters`] | both curves, normality |
//! | [`Session::set_distribution_type`] | nothing |
//! | [`Session::set_parameter_step`] | nothing |
//!
//! Everything derived from a dataset is built before any of it is stored, so a failed action
//! leaves the session as it was and a reader never sees a histogram of a different dataset.

use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::curve::{
    CurveGenerator, CurveParameters, CurvePoints, DistributionKind, ExponentialParameters,
    NormalParameters,
};
use crate::dataset::{Dataset, DatasetSummary};
use crate::error::{EngineError, Result};
use crate::fitting::FittingDistribution;
use crate::histogram::Histogram;
use crate::normality::{test_normality, NormalityReport};

/// Bin counts offered to the user.
pub const BIN_COUNT_PRESETS: [usize; 3] = [30, 40, 50];

/// Parameter steps offered to the user.
pub const PARAMETER_STEP_PRESETS: [f64; 3] = [0.05, 0.02, 0.01];

/// Which way a parameter is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Add the step.
    Increase,
    /// Subtract the step.
    Decrease,
}

impl Direction {
    fn apply(self, value: f64, step: f64) -> f64 {
        match self {
            Self::Increase => value + step,
            Self::Decrease => value - step,
        }
    }
}

/// Which parameter of the active distribution is moved.
///
/// The exponential distribution has a single parameter, its rate, which both axes move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// The mean of the normal distribution.
    Location,
    /// The standard deviation of the normal distribution.
    Spread,
}

/// The current parameters of both curves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Parameters {
    /// Parameters of the normal curve.
    pub normal: NormalParameters,
    /// Parameters of the exponential curve.
    pub exponential: ExponentialParameters,
}

impl Parameters {
    /// The parameters of the `kind` curve.
    #[must_use]
    pub fn get(&self, kind: DistributionKind) -> CurveParameters {
        match kind {
            DistributionKind::Normal => CurveParameters::Normal(self.normal),
            DistributionKind::Exponential => CurveParameters::Exponential(self.exponential),
        }
    }

    /// Returns the parameters after one step along `axis` in `direction`.
    fn adjusted(
        self,
        kind: DistributionKind,
        direction: Direction,
        axis: Axis,
        step: f64,
    ) -> Result<Self> {
        let mut next = self;
        match (kind, axis) {
            (DistributionKind::Normal, Axis::Location) => {
                next.normal = NormalParameters::new(
                    direction.apply(self.normal.mean(), step),
                    self.normal.std_dev(),
                )?;
            }
            (DistributionKind::Normal, Axis::Spread) => {
                next.normal = NormalParameters::new(
                    self.normal.mean(),
                    direction.apply(self.normal.std_dev(), step),
                )?;
            }
            (DistributionKind::Exponential, _) => {
                next.exponential =
                    ExponentialParameters::new(direction.apply(self.exponential.rate(), step))?;
            }
        }
        Ok(next)
    }
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct PlotView<'a> {
    /// The loaded dataset.
    pub dataset: &'a Dataset,
    /// Its histogram.
    pub histogram: &'a Histogram,
    /// The curve of the active distribution.
    pub curve: &'a CurvePoints,
    /// Which distribution is active.
    pub distribution: DistributionKind,
    /// The current parameters of both curves.
    pub parameters: Parameters,
    /// The normality verdict.
    pub normality: &'a NormalityReport,
}

/// State derived from one dataset.
#[derive(Debug, Clone)]
struct Loaded {
    dataset: Dataset,
    histogram: Histogram,
    normal: CurvePoints,
    exponential: CurvePoints,
    parameters: Parameters,
    normality: NormalityReport,
}

impl Loaded {
    fn build(
        dataset: Dataset,
        bin_count: usize,
        parameters: Parameters,
        generator: &mut CurveGenerator,
    ) -> Result<Self> {
        let histogram = Histogram::build(&dataset, bin_count)?;
        let normal = generator.generate(parameters.get(DistributionKind::Normal))?;
        let exponential = generator.generate(parameters.get(DistributionKind::Exponential))?;
        let normality = test_normality(&dataset);
        Ok(Self {
            dataset,
            histogram,
            normal,
            exponential,
            parameters,
            normality,
        })
    }

    fn curve(&self, kind: DistributionKind) -> &CurvePoints {
        match kind {
            DistributionKind::Normal => &self.normal,
            DistributionKind::Exponential => &self.exponential,
        }
    }

    fn curve_mut(&mut self, kind: DistributionKind) -> &mut CurvePoints {
        match kind {
            DistributionKind::Normal => &mut self.normal,
            DistributionKind::Exponential => &mut self.exponential,
        }
    }
}

/// The state of the histogram and distribution-fit engine.
///
/// ```
/// use histofit::config::SessionConfig;
/// use histofit::curve::DistributionKind;
/// use histofit::session::{Axis, Direction, Session};
///
/// let mut session = Session::new(SessionConfig::new().with_seed(1)).unwrap();
/// session.load_reader("inline", "4 1.0 2.0 3.0 4.0".as_bytes()).unwrap();
/// session.set_bin_count(2).unwrap();
/// assert_eq!(session.histogram().unwrap().boundaries(), &[2.5, 4.0]);
///
/// session.set_distribution_type(DistributionKind::Exponential).unwrap();
/// session.adjust_parameter(Direction::Increase, Axis::Spread).unwrap();
/// assert!((session.parameters().unwrap().exponential.rate() - 1.05).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    generator: CurveGenerator,
    distribution: DistributionKind,
    parameter_step: f64,
    bin_count: usize,
    loaded: Option<Loaded>,
}

impl Session {
    /// Creates a session without data.
    ///
    /// # Errors
    /// [`EngineError::Config`] if `config` fails [`SessionConfig::validate`].
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let generator = match config.seed {
            Some(seed) => CurveGenerator::with_seed(config.curve_points, config.strategy, seed)?,
            None => CurveGenerator::new(config.curve_points, config.strategy)?,
        };
        Ok(Self {
            distribution: DistributionKind::default(),
            parameter_step: config.parameter_step,
            bin_count: config.bin_count,
            generator,
            config,
            loaded: None,
        })
    }

    /// The configuration the session was created with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns `true` once a dataset has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Loads the dataset registered under `name` in the configuration.
    ///
    /// # Errors
    /// [`EngineError::FileUnavailable`] if no dataset has that name, otherwise as
    /// [`Self::load_path`].
    pub fn load(&mut self, name: &str) -> Result<()> {
        let Some(path) = self.config.datasets.get(name).cloned() else {
            warn!(name, "unknown dataset");
            return Err(EngineError::FileUnavailable {
                path: name.into(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no dataset with this name is configured",
                ),
            });
        };
        self.load_path(&path)
    }

    /// Loads the dataset stored at `path`.
    ///
    /// # Errors
    /// As [`Dataset::from_path`]. The session is unchanged on error.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let dataset = Dataset::from_path(path).inspect_err(|e| warn!(%e, "load failed"))?;
        self.load_dataset(dataset)
    }

    /// Loads a dataset from a stream, recording `name` as its source.
    ///
    /// # Errors
    /// As [`Dataset::from_reader`]. The session is unchanged on error.
    pub fn load_reader(&mut self, name: &str, reader: impl Read) -> Result<()> {
        let dataset = Dataset::from_reader(reader).inspect_err(|e| warn!(%e, "load failed"))?;
        self.load_dataset(dataset.with_source(name))
    }

    /// Replaces the current data with `dataset` and resets the parameters to their defaults.
    ///
    /// # Errors
    /// Only if a derived value cannot be computed, in which case the session is unchanged.
    pub fn load_dataset(&mut self, dataset: Dataset) -> Result<()> {
        let loaded = Loaded::build(
            dataset,
            self.bin_count,
            Parameters::default(),
            &mut self.generator,
        )?;
        info!(
            source = loaded.dataset.source().unwrap_or("<unnamed>"),
            samples = loaded.dataset.len(),
            minimum = loaded.dataset.minimum(),
            maximum = loaded.dataset.maximum(),
            is_normal = loaded.normality.is_normal,
            "dataset loaded"
        );
        self.loaded = Some(loaded);
        Ok(())
    }

    /// Rebuilds the histogram with `bin_count` bins.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load, [`EngineError::InvalidBinCount`] if
    /// `bin_count` is zero.
    pub fn set_bin_count(&mut self, bin_count: usize) -> Result<()> {
        let loaded = self.loaded.as_mut().ok_or(EngineError::NotReady)?;
        let histogram = Histogram::build(&loaded.dataset, bin_count)
            .inspect_err(|e| warn!(%e, "bin count rejected"))?;
        loaded.histogram = histogram;
        self.bin_count = bin_count;
        Ok(())
    }

    /// Moves a parameter of the active distribution by the current step and recomputes its
    /// curve.
    ///
    /// For the normal distribution [`Axis::Location`] moves the mean and [`Axis::Spread`] the
    /// standard deviation; for the exponential distribution both move the rate. The curve of the
    /// other distribution is left as it is.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load, [`EngineError::InvalidParameter`] if the
    /// standard deviation or the rate would stop being positive. Parameters are not clamped; a
    /// rejected step leaves the session unchanged.
    pub fn adjust_parameter(&mut self, direction: Direction, axis: Axis) -> Result<()> {
        let loaded = self.loaded.as_mut().ok_or(EngineError::NotReady)?;
        let kind = self.distribution;
        let parameters = loaded
            .parameters
            .adjusted(kind, direction, axis, self.parameter_step)
            .inspect_err(|e| warn!(%e, "parameter step rejected"))?;
        let curve = self.generator.generate(parameters.get(kind))?;
        *loaded.curve_mut(kind) = curve;
        loaded.parameters = parameters;
        loaded.normality = test_normality(&loaded.dataset);
        debug!(?kind, ?direction, ?axis, "parameter adjusted");
        Ok(())
    }

    /// Makes `kind` the distribution that is drawn and adjusted.
    ///
    /// Both curves are always up to date, so nothing is recomputed.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn set_distribution_type(&mut self, kind: DistributionKind) -> Result<()> {
        self.require_loaded()?;
        self.distribution = kind;
        Ok(())
    }

    /// Sets the amount by which [`Self::adjust_parameter`] moves a parameter.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load, [`EngineError::InvalidParameter`] if
    /// `step` is not finite and strictly positive.
    pub fn set_parameter_step(&mut self, step: f64) -> Result<()> {
        self.require_loaded()?;
        if !(step.is_finite() && step > 0.0) {
            warn!(step, "parameter step rejected");
            return Err(EngineError::non_positive("parameter_step", step));
        }
        self.parameter_step = step;
        Ok(())
    }

    /// Replaces both sets of parameters with estimates from the loaded dataset and recomputes
    /// both curves.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load; [`EngineError::DegenerateDataset`] or
    /// [`EngineError::InvalidParameter`] if the dataset admits no fit, in which case nothing
    /// changes.
    pub fn fit_parameters(&mut self) -> Result<()> {
        let loaded = self.loaded.as_mut().ok_or(EngineError::NotReady)?;
        let parameters = Parameters {
            normal: NormalParameters::fit(&loaded.dataset)?,
            exponential: ExponentialParameters::fit(&loaded.dataset)?,
        };
        let normal = self
            .generator
            .generate(parameters.get(DistributionKind::Normal))?;
        let exponential = self
            .generator
            .generate(parameters.get(DistributionKind::Exponential))?;
        loaded.normal = normal;
        loaded.exponential = exponential;
        loaded.parameters = parameters;
        loaded.normality = test_normality(&loaded.dataset);
        debug!(?parameters, "parameters fitted");
        Ok(())
    }

    fn require_loaded(&self) -> Result<&Loaded> {
        self.loaded.as_ref().ok_or(EngineError::NotReady)
    }

    /// The loaded dataset.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn dataset(&self) -> Result<&Dataset> {
        Ok(&self.require_loaded()?.dataset)
    }

    /// Source, size and range of the loaded dataset.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn summary(&self) -> Result<DatasetSummary> {
        Ok(self.require_loaded()?.dataset.summary())
    }

    /// The current histogram.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn histogram(&self) -> Result<&Histogram> {
        Ok(&self.require_loaded()?.histogram)
    }

    /// The curve of `kind`.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn curve(&self, kind: DistributionKind) -> Result<&CurvePoints> {
        Ok(self.require_loaded()?.curve(kind))
    }

    /// The curve of the active distribution.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn active_curve(&self) -> Result<&CurvePoints> {
        self.curve(self.distribution)
    }

    /// The current parameters of both curves.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn parameters(&self) -> Result<Parameters> {
        Ok(self.require_loaded()?.parameters)
    }

    /// The normality verdict of the loaded dataset.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn normality(&self) -> Result<&NormalityReport> {
        Ok(&self.require_loaded()?.normality)
    }

    /// Everything needed to draw the current state.
    ///
    /// # Errors
    /// [`EngineError::NotReady`] before the first load.
    pub fn view(&self) -> Result<PlotView<'_>> {
        let loaded = self.require_loaded()?;
        Ok(PlotView {
            dataset: &loaded.dataset,
            histogram: &loaded.histogram,
            curve: loaded.curve(self.distribution),
            distribution: self.distribution,
            parameters: loaded.parameters,
            normality: &loaded.normality,
        })
    }

    /// The active distribution.
    #[must_use]
    pub fn distribution_type(&self) -> DistributionKind {
        self.distribution
    }

    /// The current parameter step.
    #[must_use]
    pub fn parameter_step(&self) -> f64 {
        self.parameter_step
    }

    /// The number of bins the histogram is built with.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }
}
