//! Error types shared by the analysis components

use thiserror::Error;

/// Errors that can occur during spectral analysis or note mapping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid parameters, or styled output requested from an unstyled table (and vice versa)
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The input is not a usable single-channel waveform
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
    /// The computation was cancelled between windows
    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Configuration(msg.into())
    }

    pub(crate) fn input(msg: impl Into<String>) -> Self {
        AnalysisError::UnsupportedInput(msg.into())
    }
}

/// Result alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
