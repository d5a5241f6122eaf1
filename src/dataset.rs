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

//! Contains [`Dataset`], the loaded samples together with their summary statistics.
//!
//! The text format is a sample count `N` followed by `N` floating-point numbers, all separated
//! by whitespace:
//!
//! ```text
//! 4
//! 1.0 2.0
//! 3.0 4.0
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use statrs::statistics::Statistics;

use crate::error::{EngineError, Result};

/// Name used as the source of datasets read from a stream.
const STREAM_SOURCE: &str = "<stream>";

/// A one-dimensional sample with its range and standardized moments.
///
/// The statistics are computed once, when the dataset is built. A dataset is never modified
/// afterwards; loading new data builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    source: Option<String>,
    samples: Vec<f64>,
    minimum: f64,
    maximum: f64,
    mean: f64,
    std_dev: f64,
    skewness: f64,
    kurtosis: f64,
}

impl Dataset {
    /// Builds a dataset from in-memory samples.
    ///
    /// # Errors
    /// [`EngineError::MalformedInput`] if `samples` is empty or contains a non-finite value.
    pub fn new(samples: Vec<f64>) -> Result<Self> {
        if samples.is_empty() {
            return Err(EngineError::MalformedInput(
                "a dataset needs at least one sample".to_string(),
            ));
        }
        if let Some(position) = samples.iter().position(|x| !x.is_finite()) {
            return Err(EngineError::MalformedInput(format!(
                "sample {} is not a finite number",
                position + 1
            )));
        }

        let (minimum, maximum) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });

        #[allow(clippy::float_cmp)]
        // With all samples equal the mean can still be off by an ulp, which would leave a
        // tiny positive variance and meaningless standardized moments.
        let moments = if minimum == maximum {
            Moments {
                mean: minimum,
                std_dev: 0.0,
                skewness: 0.0,
                kurtosis: 3.0,
            }
        } else {
            moments(&samples)
        };

        Ok(Self {
            source: None,
            samples,
            minimum,
            maximum,
            mean: moments.mean,
            std_dev: moments.std_dev,
            skewness: moments.skewness,
            kurtosis: moments.kurtosis,
        })
    }

    /// Parses a dataset from its text form.
    ///
    /// Only the first `N` numbers after the count are read; anything after them is ignored.
    ///
    /// # Errors
    /// [`EngineError::MalformedInput`] if the count is missing, zero or not an integer, if fewer
    /// than `N` numbers follow it, or if one of them is not a number.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();
        let count_token = tokens
            .next()
            .ok_or_else(|| EngineError::MalformedInput("missing sample count".to_string()))?;
        let count: usize = count_token.parse().map_err(|_| {
            EngineError::MalformedInput(format!("sample count {count_token:?} is not an integer"))
        })?;

        // The count is untrusted; every sample takes at least two bytes of text.
        let mut samples = Vec::with_capacity(count.min(text.len() / 2 + 1));
        for index in 0..count {
            let token = tokens.next().ok_or_else(|| {
                EngineError::MalformedInput(format!("expected {count} samples, found {index}"))
            })?;
            let value: f64 = token.parse().map_err(|_| {
                EngineError::MalformedInput(format!(
                    "sample {} ({token:?}) is not a number",
                    index + 1
                ))
            })?;
            samples.push(value);
        }

        Self::new(samples)
    }

    /// Reads and parses a dataset from a stream.
    ///
    /// # Errors
    /// [`EngineError::FileUnavailable`] if reading fails, otherwise as [`Self::parse`].
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| EngineError::FileUnavailable {
                path: PathBuf::from(STREAM_SOURCE),
                source,
            })?;
        let text = String::from_utf8(bytes)
            .map_err(|_| EngineError::MalformedInput("input is not valid UTF-8".to_string()))?;
        Self::parse(&text)
    }

    /// Reads and parses the dataset stored at `path`.
    ///
    /// The file name becomes the dataset's [source](Self::source).
    ///
    /// # Errors
    /// [`EngineError::FileUnavailable`] if the file cannot be opened or read, otherwise as
    /// [`Self::parse`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::InvalidData {
                EngineError::MalformedInput(format!("{} is not valid UTF-8", path.display()))
            } else {
                EngineError::FileUnavailable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::parse(&text)?.with_source(name))
    }

    /// Attaches a source identifier, such as a file or dataset name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Identifier of where the samples came from, if known.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The samples in the order they were read.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of samples. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; a dataset holds at least one sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Smallest sample.
    #[must_use]
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Largest sample.
    #[must_use]
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    /// `maximum - minimum`. Infinite if the difference exceeds the `f64` range.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.maximum - self.minimum
    }

    /// Sample mean.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (divided by `N`). Infinite if it exceeds the `f64` range.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }

    /// Population standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Third standardized moment. `0.0` for a degenerate dataset.
    #[must_use]
    pub fn skewness(&self) -> f64 {
        self.skewness
    }

    /// Fourth standardized moment, not the excess kurtosis. `3.0` for a degenerate dataset.
    #[must_use]
    pub fn kurtosis(&self) -> f64 {
        self.kurtosis
    }

    /// Returns `true` if all samples are equal, so the variance is zero.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_degenerate(&self) -> bool {
        self.std_dev == 0.0
    }

    /// The part of the dataset shown next to the plot.
    #[must_use]
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            source: self.source.clone(),
            count: self.len(),
            minimum: self.minimum,
            maximum: self.maximum,
        }
    }
}

/// Source, size and range of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    /// Where the samples came from, if known.
    pub source: Option<String>,
    /// Number of samples.
    pub count: usize,
    /// Smallest sample.
    pub minimum: f64,
    /// Largest sample.
    pub maximum: f64,
}

/// Mean, spread and shape of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Moments {
    pub(crate) mean: f64,
    /// Population standard deviation.
    pub(crate) std_dev: f64,
    /// `m3 / m2^1.5`, or `0.0` without spread.
    pub(crate) skewness: f64,
    /// `m4 / m2^2`, or `3.0` without spread.
    pub(crate) kurtosis: f64,
}

/// Computes the moments of a non-empty `samples`.
///
/// The samples are first divided by a power of two close to their largest magnitude. The
/// division is exact, keeps the fourth powers of the deviations in range for any finite input
/// and leaves the standardized moments unchanged.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub(crate) fn moments(samples: &[f64]) -> Moments {
    let magnitude = samples.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    let scale = if magnitude > 0.0 {
        2.0_f64.powi(magnitude.log2().floor().clamp(-1022.0, 1023.0) as i32)
    } else {
        1.0
    };
    let mean = Statistics::mean(samples.iter().map(|x| x / scale));

    let n = samples.len() as f64;
    let (s2, s3, s4) = samples.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), &x| {
        let d = x / scale - mean;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    });
    let (m2, m3, m4) = (s2 / n, s3 / n, s4 / n);
    let (skewness, kurtosis) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2))
    } else {
        (0.0, 3.0)
    };
    Moments {
        mean: mean * scale,
        std_dev: m2.sqrt() * scale,
        skewness,
        kurtosis,
    }
}
