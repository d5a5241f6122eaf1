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

//! Contains [`SessionConfig`], the settings a [`Session`](crate::session::Session) starts with.
//!
//! A configuration can be built in code or read from TOML:
//!
//! ```
//! use histofit::config::SessionConfig;
//!
//! let config = SessionConfig::from_toml(
//!     r#"
//!     bin_count = 40
//!     seed = 7
//!
//!     [datasets]
//!     normal = "data/normal.dat"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.bin_count, 40);
//! assert_eq!(config.curve_points, 100);
//! assert!(config.datasets.contains_key("normal"));
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::curve::CurveStrategy;
use crate::error::{EngineError, Result};

/// Settings of a session.
///
/// Every field has a default, so a TOML document only needs to name the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of points in each theoretical curve.
    pub curve_points: usize,
    /// Number of histogram bins used until [`Session::set_bin_count`] is called.
    ///
    /// [`Session::set_bin_count`]: crate::session::Session::set_bin_count
    pub bin_count: usize,
    /// Amount by which one parameter adjustment moves a parameter.
    pub parameter_step: f64,
    /// How the x-coordinates of the theoretical curves are chosen.
    pub strategy: CurveStrategy,
    /// Seed of the curve generator. `None` seeds from the operating system.
    pub seed: Option<u64>,
    /// Known datasets, by name, for [`Session::load`](crate::session::Session::load).
    pub datasets: BTreeMap<String, PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            curve_points: Self::DEFAULT_CURVE_POINTS,
            bin_count: Self::DEFAULT_BIN_COUNT,
            parameter_step: Self::DEFAULT_PARAMETER_STEP,
            strategy: CurveStrategy::default(),
            seed: None,
            datasets: BTreeMap::new(),
        }
    }
}

impl SessionConfig {
    /// Default number of points per theoretical curve.
    pub const DEFAULT_CURVE_POINTS: usize = 100;
    /// Default number of histogram bins.
    pub const DEFAULT_BIN_COUNT: usize = 30;
    /// Default parameter step.
    pub const DEFAULT_PARAMETER_STEP: f64 = 0.05;

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named dataset that [`Session::load`](crate::session::Session::load) can
    /// find.
    #[must_use]
    pub fn with_dataset(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.datasets.insert(name.into(), path.into());
        self
    }

    /// Fixes the seed of the curve generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parses and validates a configuration from a TOML document.
    ///
    /// # Errors
    /// [`EngineError::Config`] if the document is not valid TOML for this struct or if
    /// [`Self::validate`] rejects it.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    /// [`EngineError::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Checks that the values can be used to build a session.
    ///
    /// # Errors
    /// [`EngineError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.curve_points == 0 {
            return Err(EngineError::Config(
                "curve_points must be positive".to_string(),
            ));
        }
        if self.bin_count == 0 {
            return Err(EngineError::Config("bin_count must be positive".to_string()));
        }
        if !(self.parameter_step.is_finite() && self.parameter_step > 0.0) {
            return Err(EngineError::Config(
                "parameter_step must be finite and positive".to_string(),
            ));
        }
        Ok(())
    }
}
