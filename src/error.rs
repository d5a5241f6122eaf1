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

//! Contains [`EngineError`], the error type of every fallible operation in the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the engine.
///
/// None of these is fatal to the process. A failed operation leaves the [`Session`] it was
/// called on exactly as it was before the call.
///
/// [`Session`]: crate::session::Session
#[derive(Error, Debug)]
pub enum EngineError {
    /// The data source could not be opened or read.
    #[error("{} couldn't be opened: {source}", path.display())]
    FileUnavailable {
        /// Path or dataset name that was requested.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The data source does not follow the "count followed by floats" format.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A histogram was requested with zero bins.
    #[error("invalid bin count {0}: at least one bin is required")]
    InvalidBinCount(usize),

    /// A distribution or engine parameter is outside its domain.
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// What the value is required to satisfy.
        reason: &'static str,
    },

    /// The dataset has zero variance, so its standardized moments are undefined.
    #[error("degenerate dataset: all samples are equal")]
    DegenerateDataset,

    /// An operation was invoked before any dataset was loaded.
    #[error("no dataset has been loaded")]
    NotReady,

    /// The configuration could not be parsed or failed validation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Shorthand for [`EngineError::InvalidParameter`] with the "must be positive" reason.
    pub(crate) fn non_positive(name: &'static str, value: f64) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason: "must be finite and strictly positive",
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
