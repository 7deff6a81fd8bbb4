#![warn(missing_docs)]
//! # rustpod: post-processing of proper orthogonal decompositions
//!
//! Utilities for analysing POD results of PIV velocity fields:
//! - [`modes`]: un-flatten stacked mode matrices into spatial mode fields
//! - [`coefficients`]: joint histograms and scatter grids of temporal coefficients
//! - [`fit`]: least-squares objective for fitting a synthetic vortex model
//!
//! All routines are pure functions of their input arrays. They return data
//! in plot-ready shapes; rendering is left to the caller.
pub mod coefficients;
pub mod config;
pub mod error;
pub mod fit;
pub mod modes;
pub mod types;

pub use coefficients::{
    bin_coefficients, histogram2d, pair_grid, position_heatmaps, BinSettings, HistogramGrid,
    PairGrid,
};
pub use config::{load_config, AnalysisConfig};
pub use error::{PodError, Result};
pub use fit::{log_posterior, log_prior, residual, FieldGenerator, ParamBounds};
pub use modes::{reconstruct, ModeFields, ModePanel};
pub use types::{Component, FloatNum};
