//! Analysis parameters in a simple key=value format
//!
//! ```text
//! # notescope analysis
//! frequency_resolution=5
//! octave_count=6
//! scale=1.0
//! included=C,D,E,F,G,A,B
//! threshold=1e6
//! threads=4
//! ```

use notescope_analysis::{
    AnalysisError, NotePresenceQuery, NoteSet, NoteTableConfig, Semitone, SpectralAnalyzer,
    DEFAULT_FREQUENCY_RESOLUTION, DEFAULT_OCTAVE_COUNT,
};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while reading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Parameters for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Windows per second; the window is `sample_rate / frequency_resolution` samples
    pub frequency_resolution: u32,
    pub octave_count: u32,
    /// Multiplier applied to the overlay note frequencies
    pub scale: f64,
    /// Semitones to annotate and query
    pub included: NoteSet,
    /// Peak power a note must exceed; no note query runs without one
    pub threshold: Option<f64>,
    /// Worker threads for the per-window transform
    pub threads: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frequency_resolution: DEFAULT_FREQUENCY_RESOLUTION,
            octave_count: DEFAULT_OCTAVE_COUNT,
            scale: 1.0,
            included: NoteSet::all(),
            threshold: None,
            threads: 1,
        }
    }
}

impl AnalysisConfig {
    /// Load config from a file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse config from key=value lines
    ///
    /// Blank lines, `#` comments and unknown keys are ignored.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "frequency_resolution" => {
                        config.frequency_resolution = parse_value(key, value)?;
                    }
                    "octave_count" => config.octave_count = parse_value(key, value)?,
                    "scale" => config.scale = parse_value(key, value)?,
                    "included" => config.included = parse_note_set(key, value)?,
                    "threshold" => {
                        config.threshold = if value.is_empty() || value == "none" {
                            None
                        } else {
                            Some(parse_value(key, value)?)
                        };
                    }
                    "threads" => config.threads = parse_value(key, value)?,
                    _ => {}
                }
            }
        }

        Ok(config)
    }

    /// Render config in the format `parse` reads
    pub fn to_text(&self) -> String {
        let mut out = String::from("# notescope analysis\n");
        let _ = writeln!(out, "frequency_resolution={}", self.frequency_resolution);
        let _ = writeln!(out, "octave_count={}", self.octave_count);
        let _ = writeln!(out, "scale={}", self.scale);
        let labels: Vec<&str> = self.included.iter().map(|s| s.label()).collect();
        let _ = writeln!(out, "included={}", labels.join(","));
        if let Some(threshold) = self.threshold {
            let _ = writeln!(out, "threshold={}", threshold);
        }
        let _ = writeln!(out, "threads={}", self.threads);
        out
    }

    /// Spectrogram builder for these settings
    pub fn analyzer(&self) -> Result<SpectralAnalyzer, AnalysisError> {
        Ok(SpectralAnalyzer::new(self.frequency_resolution)?.with_threads(self.threads))
    }

    /// Styled overlay table for these settings
    pub fn note_table_config(&self) -> NoteTableConfig {
        NoteTableConfig::new()
            .octave_count(self.octave_count)
            .scale(self.scale)
            .included(self.included)
            .with_styling(true)
    }

    /// Note-presence query, when a threshold is set
    pub fn presence_query(&self) -> Option<NotePresenceQuery> {
        self.threshold.map(|threshold| {
            NotePresenceQuery::new(threshold)
                .octave_count(self.octave_count)
                .included(self.included)
        })
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn parse_note_set(key: &str, value: &str) -> Result<NoteSet, ConfigError> {
    match value {
        "all" => return Ok(NoteSet::all()),
        "c_major" => return Ok(NoteSet::c_major()),
        _ => {}
    }

    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Semitone::from_label(name).ok_or_else(|| invalid(key, value)))
        .collect()
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let config = AnalysisConfig::parse("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.frequency_resolution, 5);
        assert_eq!(config.octave_count, 6);
        assert!(config.threshold.is_none());
    }

    #[test]
    fn test_parse_values() {
        let content = "# Comment\n\
                       frequency_resolution = 10\n\
                       octave_count=8\n\
                       scale=0.5\n\
                       included=C, Cs, F#\n\
                       threshold=2.5e4\n\
                       threads=4\n\
                       colour=blue\n";
        let config = AnalysisConfig::parse(content).unwrap();
        assert_eq!(config.frequency_resolution, 10);
        assert_eq!(config.octave_count, 8);
        assert_eq!(config.scale, 0.5);
        assert_eq!(config.included.len(), 3);
        assert!(config.included.contains(Semitone::FSharp));
        assert_eq!(config.threshold, Some(25000.0));
        assert_eq!(config.threads, 4);
    }

    #[test]
    fn test_parse_shorthands() {
        let config = AnalysisConfig::parse("included=c_major").unwrap();
        assert_eq!(config.included, NoteSet::c_major());

        let config = AnalysisConfig::parse("included=").unwrap();
        assert!(config.included.is_empty());

        let config = AnalysisConfig::parse("threshold=none").unwrap();
        assert!(config.threshold.is_none());
    }

    #[test]
    fn test_parse_invalid() {
        let err = AnalysisConfig::parse("octave_count=many").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "octave_count"));

        let err = AnalysisConfig::parse("included=C,H").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_text_roundtrip() {
        let config = AnalysisConfig {
            frequency_resolution: 4,
            included: NoteSet::c_major(),
            threshold: Some(1.5),
            threads: 2,
            ..Default::default()
        };
        let parsed = AnalysisConfig::parse(&config.to_text()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.txt");
        std::fs::write(&path, "octave_count=3\n").unwrap();
        let config = AnalysisConfig::load_from(&path).unwrap();
        assert_eq!(config.octave_count, 3);

        let err = AnalysisConfig::load_from(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_builds_core_types() {
        let config = AnalysisConfig {
            threads: 3,
            threshold: Some(10.0),
            ..Default::default()
        };
        let analyzer = config.analyzer().unwrap();
        assert_eq!(analyzer.frequency_resolution(), 5);
        assert_eq!(analyzer.threads(), 3);
        assert!(config.note_table_config().with_styling);
        assert_eq!(config.presence_query().unwrap().threshold, 10.0);

        let bad = AnalysisConfig {
            frequency_resolution: 0,
            ..Default::default()
        };
        assert!(bad.analyzer().is_err());
    }
}
