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

//! Histograms of one-dimensional data with theoretical curves drawn over them.
//!
//! Histofit is the engine behind an interactive plotting tool. It reads a dataset, estimates its
//! density with a histogram, computes a normal and an exponential curve for the user to compare
//! against the histogram, and says whether the data looks normal according to the Jarque-Bera
//! statistic. Drawing is left to the caller: every result is a plain array of numbers.
//!
//! # Examples
//!
//! A histogram and the normality verdict can be computed directly:
//!
//! ```
//! use histofit::dataset::Dataset;
//! use histofit::histogram::Histogram;
//! use histofit::normality::test_normality;
//!
//! let dataset = Dataset::parse("6  -1.2 -0.4 0.0 0.3 0.5 1.1").unwrap();
//! let histogram = Histogram::build(&dataset, 3).unwrap();
//!
//! // The histogram is a density: the bar areas add up to one.
//! assert!((histogram.total_probability() - 1.0).abs() < 1e-12);
//! assert_eq!(histogram.counts().iter().sum::<usize>(), dataset.len());
//!
//! let report = test_normality(&dataset);
//! println!("JB = {:.3}, normal: {}", report.statistic, report.is_normal);
//! ```
//!
//! An interactive front end keeps a [`Session`] and forwards user actions to it. After every
//! action it redraws from [`Session::view`]:
//!
//! ```
//! use histofit::config::SessionConfig;
//! use histofit::curve::DistributionKind;
//! use histofit::session::{Axis, Direction, Session};
//!
//! let mut session = Session::new(SessionConfig::new().with_seed(5)).unwrap();
//! session
//!     .load_reader("measurements", "5 0.2 0.9 1.4 2.2 3.8".as_bytes())
//!     .unwrap();
//!
//! // Arrow keys nudge the active distribution.
//! session.adjust_parameter(Direction::Increase, Axis::Location).unwrap();
//! session.set_distribution_type(DistributionKind::Exponential).unwrap();
//! session.set_parameter_step(0.01).unwrap();
//! session.adjust_parameter(Direction::Decrease, Axis::Spread).unwrap();
//!
//! let view = session.view().unwrap();
//! assert_eq!(view.dataset.source(), Some("measurements"));
//! assert_eq!(view.curve.len(), 100);
//! assert!((view.parameters.normal.mean() - 0.05).abs() < 1e-12);
//! assert!((view.parameters.exponential.rate() - 0.99).abs() < 1e-12);
//! ```
//!
//! The verdict uses a flat threshold of 3 on the Jarque-Bera statistic and the normal curve uses
//! a simplified density; both are documented in [`normality`] and [`curve`].
#![deny(clippy::pedantic)]
#![deny(missing_docs)]

pub mod config;
pub mod curve;
pub mod dataset;
pub mod error;
pub mod fitting;
pub mod histogram;
pub mod monte_carlo;
pub mod normality;
pub mod sample;
pub mod session;

pub use error::{EngineError, Result};
pub use session::Session;
