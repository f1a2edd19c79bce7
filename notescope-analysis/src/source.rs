//! Decoded single-channel audio handed to the analyzer

use crate::error::{AnalysisError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A decoded mono recording
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    sample_rate: u32,
    samples: Vec<f32>,
    title: String,
}

impl AudioSource {
    /// Create a source, rejecting a zero sample rate or an empty recording
    pub fn new(sample_rate: u32, samples: Vec<f32>, title: impl Into<String>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::input("sample rate must be positive"));
        }
        if samples.is_empty() {
            return Err(AnalysisError::input("recording contains no samples"));
        }
        Ok(Self {
            sample_rate,
            samples,
            title: title.into(),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Shared flag for stopping a long analysis between windows
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
