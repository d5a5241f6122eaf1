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

//! Contains [`Histogram`], a density estimate of a [`Dataset`].
//!
//! The range `[minimum, maximum]` of the dataset is split into bins of equal width. Bins are
//! closed on the right: a sample `s` belongs to bin `i` if `lower(i) < s <= upper(i)`. The
//! first bin is also closed on the left, so the minimum itself is counted.
//!
//! ```
//! use histofit::dataset::Dataset;
//! use histofit::histogram::Histogram;
//!
//! let dataset = Dataset::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let histogram = Histogram::build(&dataset, 2).unwrap();
//! assert_eq!(histogram.boundaries(), &[2.5, 4.0]);
//! assert_eq!(histogram.counts(), &[2, 2]);
//! assert!((histogram.densities()[0] - 1.0 / 3.0).abs() < 1e-12);
//! ```

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{EngineError, Result};

/// Bin edges and densities of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Lower edge of the first bin.
    origin: f64,
    bin_width: f64,
    /// Right edge of every bin.
    boundaries: Vec<f64>,
    counts: Vec<usize>,
    densities: Vec<f64>,
}

impl Histogram {
    /// Width of the single bin used when all samples are equal.
    pub const DEGENERATE_BIN_WIDTH: f64 = 1.0;

    /// Splits the range of `dataset` into `bin_count` bins and computes the density of each.
    ///
    /// If all samples are equal there is no range to split. The histogram then has a single
    /// bin of width [`Self::DEGENERATE_BIN_WIDTH`] centred on the common value, holding all the
    /// probability.
    ///
    /// If the range is only a few representable numbers wide, `bin_count` edges may not all be
    /// distinct. The histogram then has a single bin spanning the range. A range wider than the
    /// largest `f64` is split into at least two bins, so that the bin width stays finite.
    ///
    /// # Errors
    /// [`EngineError::InvalidBinCount`] if `bin_count` is zero.
    pub fn build(dataset: &Dataset, bin_count: usize) -> Result<Self> {
        if bin_count == 0 {
            return Err(EngineError::InvalidBinCount(bin_count));
        }
        if dataset.range() <= 0.0 {
            debug!(
                value = dataset.minimum(),
                "all samples equal, using a single-bin histogram"
            );
            return Ok(Self::single_bin(dataset));
        }

        let minimum = dataset.minimum();
        let bin_count = if dataset.range().is_finite() {
            bin_count
        } else {
            bin_count.max(2)
        };
        let (bin_width, boundaries) = split_range(dataset, bin_count).unwrap_or_else(|| {
            debug!(
                bin_count,
                range = dataset.range(),
                "range too narrow for the bin count, using a single bin"
            );
            (dataset.range(), vec![dataset.maximum()])
        });

        let mut counts = vec![0_usize; boundaries.len()];
        for &sample in dataset.samples() {
            counts[bin_index(&boundaries, minimum, bin_width, sample)] += 1;
        }

        #[allow(clippy::cast_precision_loss)]
        let total = dataset.len() as f64;
        #[allow(clippy::cast_precision_loss)]
        let densities = counts
            .iter()
            .map(|&count| count as f64 / total / bin_width)
            .collect();

        debug!(bin_count = boundaries.len(), bin_width, "histogram built");
        Ok(Self {
            origin: minimum,
            bin_width,
            boundaries,
            counts,
            densities,
        })
    }

    fn single_bin(dataset: &Dataset) -> Self {
        let half = Self::DEGENERATE_BIN_WIDTH / 2.0;
        Self {
            origin: dataset.minimum() - half,
            bin_width: Self::DEGENERATE_BIN_WIDTH,
            boundaries: vec![dataset.minimum() + half],
            counts: vec![dataset.len()],
            densities: vec![1.0 / Self::DEGENERATE_BIN_WIDTH],
        }
    }

    /// Number of bins.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.boundaries.len()
    }

    /// Width shared by all bins.
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Right edge of each bin, in increasing order.
    #[must_use]
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Number of samples in each bin.
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Estimated probability density of each bin.
    #[must_use]
    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// Left edge of bin `index`, or `None` if there is no such bin. The left edge of bin 0 is
    /// the dataset minimum.
    #[must_use]
    pub fn lower_edge(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.origin),
            _ if index < self.bin_count() => Some(self.boundaries[index - 1]),
            _ => None,
        }
    }

    /// Iterator over `(lower edge, upper edge, density)` of every bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        std::iter::once(self.origin)
            .chain(self.boundaries.iter().copied())
            .zip(self.boundaries.iter().zip(&self.densities))
            .map(|(lower, (&upper, &density))| (lower, upper, density))
    }

    /// Largest bin density, used to scale the vertical axis.
    #[must_use]
    pub fn max_density(&self) -> f64 {
        self.densities.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest bin density.
    #[must_use]
    pub fn min_density(&self) -> f64 {
        self.densities.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// `Σ density · width`; 1 up to rounding.
    #[must_use]
    pub fn total_probability(&self) -> f64 {
        self.densities.iter().map(|d| d * self.bin_width).sum()
    }
}

/// Bin width and right edges for `bin_count` bins over the range of `dataset`.
///
/// Returns `None` if the edges are not strictly increasing.
fn split_range(dataset: &Dataset, bin_count: usize) -> Option<(f64, Vec<f64>)> {
    let (minimum, maximum) = (dataset.minimum(), dataset.maximum());
    #[allow(clippy::cast_precision_loss)]
    let n = bin_count as f64;
    let bin_width = if dataset.range().is_finite() {
        dataset.range() / n
    } else {
        maximum / n - minimum / n
    };
    #[allow(clippy::cast_precision_loss)]
    let mut boundaries: Vec<f64> = (1..=bin_count)
        .map(|k| {
            let k = k as f64;
            let edge = minimum + bin_width * k;
            if edge.is_finite() {
                edge
            } else {
                // `bin_width * k` overflows when the range does; halving is exact.
                2.0 * (minimum / 2.0 + bin_width / 2.0 * k)
            }
        })
        .collect();
    // Rounding may leave the last edge just below the maximum.
    if let Some(last) = boundaries.last_mut() {
        *last = maximum;
    }

    let increasing = std::iter::once(minimum)
        .chain(boundaries.iter().copied())
        .zip(&boundaries)
        .all(|(lower, &upper)| lower < upper);
    increasing.then_some((bin_width, boundaries))
}

/// Index of the bin that holds `sample`.
///
/// The guess from the bin width is corrected against the stored edges, so the result agrees
/// with comparing `sample` to the edges directly.
fn bin_index(boundaries: &[f64], minimum: f64, bin_width: f64, sample: f64) -> usize {
    let last = boundaries.len() - 1;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut index = (((sample - minimum) / bin_width).ceil() as usize)
        .saturating_sub(1)
        .min(last);
    while index > 0 && sample <= boundaries[index - 1] {
        index -= 1;
    }
    while index < last && sample > boundaries[index] {
        index += 1;
    }
    index
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// Counts by the definition: `lower < s <= upper`, with the minimum in bin 0.
    fn reference_counts(dataset: &Dataset, histogram: &Histogram) -> Vec<usize> {
        (0..histogram.bin_count())
            .map(|i| {
                let lower = histogram.lower_edge(i).unwrap();
                let upper = histogram.boundaries()[i];
                dataset
                    .samples()
                    .iter()
                    .filter(|&&s| (lower < s || (i == 0 && s == lower)) && s <= upper)
                    .count()
            })
            .collect()
    }

    #[test]
    fn four_samples_two_bins() {
        let dataset = Dataset::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let histogram = Histogram::build(&dataset, 2).unwrap();
        assert_eq!(histogram.bin_width(), 1.5);
        assert_eq!(histogram.boundaries(), &[2.5, 4.0]);
        assert_eq!(histogram.counts(), &[2, 2]);
        for density in histogram.densities() {
            assert!((density - 2.0 / 4.0 / 1.5).abs() < 1e-12);
        }
        assert_eq!(histogram.lower_edge(0), Some(1.0));
        assert_eq!(histogram.lower_edge(1), Some(2.5));
        assert_eq!(histogram.lower_edge(2), None);
    }

    #[test]
    fn minimum_lands_in_first_bin() {
        let dataset = Dataset::new(vec![0.0, 10.0]).unwrap();
        let histogram = Histogram::build(&dataset, 5).unwrap();
        assert_eq!(histogram.counts(), &[1, 0, 0, 0, 1]);
    }

    #[test]
    fn sample_on_edge_goes_left() {
        let dataset = Dataset::new(vec![0.0, 1.0, 2.0, 4.0]).unwrap();
        let histogram = Histogram::build(&dataset, 4).unwrap();
        // edges 1, 2, 3, 4
        assert_eq!(histogram.counts(), &[2, 1, 0, 1]);
    }

    #[test]
    fn single_bin_holds_everything() {
        let dataset = Dataset::new(vec![3.0, -1.0, 7.0]).unwrap();
        let histogram = Histogram::build(&dataset, 1).unwrap();
        assert_eq!(histogram.counts(), &[3]);
        assert!((histogram.total_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_bins_is_rejected() {
        let dataset = Dataset::new(vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            Histogram::build(&dataset, 0),
            Err(EngineError::InvalidBinCount(0))
        ));
    }

    #[test]
    fn constant_dataset_falls_back_to_one_bin() {
        let dataset = Dataset::new(vec![5.0; 10]).unwrap();
        let histogram = Histogram::build(&dataset, 30).unwrap();
        assert_eq!(histogram.bin_count(), 1);
        assert_eq!(histogram.counts(), &[10]);
        assert_eq!(histogram.densities(), &[1.0]);
        assert_eq!(histogram.lower_edge(0), Some(4.5));
        assert_eq!(histogram.lower_edge(1), None);
        assert_eq!(histogram.boundaries(), &[5.5]);
        assert!(histogram.densities().iter().all(|d| d.is_finite()));
        assert_eq!(histogram.total_probability(), 1.0);
    }

    fn assert_well_formed(dataset: &Dataset, histogram: &Histogram) {
        let edges: Vec<f64> = std::iter::once(histogram.lower_edge(0).unwrap())
            .chain(histogram.boundaries().iter().copied())
            .collect();
        assert!(edges.windows(2).all(|w| w[0] < w[1]), "{edges:?}");
        assert!(histogram.bin_width().is_finite() && histogram.bin_width() > 0.0);
        assert!(histogram.densities().iter().all(|d| d.is_finite()));
        assert_eq!(histogram.counts().iter().sum::<usize>(), dataset.len());
        assert!((histogram.total_probability() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn range_beyond_f64_is_split() {
        let dataset = Dataset::new(vec![-1e308, 0.0, 1e308]).unwrap();
        let histogram = Histogram::build(&dataset, 4).unwrap();
        assert_well_formed(&dataset, &histogram);
        assert_eq!(histogram.bin_width(), 5e307);
        let boundaries = histogram.boundaries();
        assert_eq!(&boundaries[..2], &[-5e307, 0.0]);
        assert!((boundaries[2] / 5e307 - 1.0).abs() < 1e-12);
        assert_eq!(boundaries[3], 1e308);
        assert_eq!(histogram.counts(), &[1, 1, 0, 1]);
    }

    #[test]
    fn range_beyond_f64_needs_two_bins() {
        let dataset = Dataset::new(vec![-f64::MAX, f64::MAX]).unwrap();
        let histogram = Histogram::build(&dataset, 1).unwrap();
        assert_eq!(histogram.bin_count(), 2);
        assert_well_formed(&dataset, &histogram);
        assert_eq!(histogram.counts(), &[1, 1]);
    }

    #[test]
    fn narrow_range_collapses_to_one_bin() {
        let above_one = f64::from_bits(1.0_f64.to_bits() + 1);
        let dataset = Dataset::new(vec![1.0, above_one, 1.0]).unwrap();
        let histogram = Histogram::build(&dataset, 30).unwrap();
        assert_eq!(histogram.bin_count(), 1);
        assert_eq!(histogram.lower_edge(0), Some(1.0));
        assert_eq!(histogram.boundaries(), &[above_one]);
        assert_eq!(histogram.counts(), &[3]);
        assert_well_formed(&dataset, &histogram);
    }

    #[test]
    fn narrow_range_keeps_bins_that_fit() {
        // Four ulps are enough for two bins.
        let top = f64::from_bits(1.0_f64.to_bits() + 4);
        let dataset = Dataset::new(vec![1.0, top]).unwrap();
        let histogram = Histogram::build(&dataset, 2).unwrap();
        assert_eq!(histogram.bin_count(), 2);
        assert_well_formed(&dataset, &histogram);
    }

    #[test]
    fn density_extremes() {
        let dataset = Dataset::new(vec![0.0, 0.1, 0.2, 3.0]).unwrap();
        let histogram = Histogram::build(&dataset, 3).unwrap();
        assert_eq!(histogram.counts(), &[3, 0, 1]);
        assert_eq!(histogram.min_density(), 0.0);
        assert!((histogram.max_density() - 3.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn bins_iterator_pairs_edges() {
        let dataset = Dataset::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let histogram = Histogram::build(&dataset, 3).unwrap();
        let bins: Vec<_> = histogram.bins().collect();
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[0].0, 1.0);
        assert_eq!(bins[2].1, 4.0);
        for window in bins.windows(2) {
            assert_eq!(window[0].1, window[1].0);
        }
    }

    proptest! {
        #[test]
        fn every_sample_counted_once(
            samples in prop::collection::vec(-1.0e3..1.0e3_f64, 1..200),
            bin_count in 1_usize..64,
        ) {
            let dataset = Dataset::new(samples).unwrap();
            let histogram = Histogram::build(&dataset, bin_count).unwrap();
            prop_assert_eq!(histogram.counts().iter().sum::<usize>(), dataset.len());
        }

        #[test]
        fn densities_integrate_to_one(
            samples in prop::collection::vec(-50.0..50.0_f64, 1..200),
            bin_count in 1_usize..64,
        ) {
            let dataset = Dataset::new(samples).unwrap();
            let histogram = Histogram::build(&dataset, bin_count).unwrap();
            prop_assert!((histogram.total_probability() - 1.0).abs() < 1e-9);
        }

        #[test]
        fn matches_comparison_definition(
            samples in prop::collection::vec(-10.0..10.0_f64, 2..100),
            bin_count in 1_usize..40,
        ) {
            let dataset = Dataset::new(samples).unwrap();
            let histogram = Histogram::build(&dataset, bin_count).unwrap();
            let expected = reference_counts(&dataset, &histogram);
            prop_assert_eq!(histogram.counts(), expected.as_slice());
        }
    }
}
