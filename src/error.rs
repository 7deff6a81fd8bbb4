//! Error type shared by all post-processing routines
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PodError>;

/// Errors raised while reshaping, binning or fitting
#[derive(Debug, Error)]
pub enum PodError {
    /// Dimension or count mismatch between paired arrays
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// Argument outside of its valid range
    #[error("Invalid argument: {0}")]
    Domain(String),

    /// Configuration file could not be read
    #[error("Unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl PodError {
    pub(crate) fn shape<S: Into<String>>(msg: S) -> Self {
        PodError::Shape(msg.into())
    }

    pub(crate) fn domain<S: Into<String>>(msg: S) -> Self {
        PodError::Domain(msg.into())
    }
}
