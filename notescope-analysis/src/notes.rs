//! Note frequency table across octaves
//!
//! Expands the octave-0 fundamentals into every requested octave. An entry
//! labelled `k` (e.g. "A4") holds `fundamental * scale * 2^k`, so label "0"
//! is the raw fundamental and labels run from 0 to `octave_count + 1`.
//!
//! The `scale` factor converts Hz into other units; the note-presence query
//! passes `1 / bin_width_hz` to get fractional bin indices.

use crate::error::{AnalysisError, Result};
use crate::semitone::{Color, LineStyle, NoteSet, NoteStyle, Semitone};
use std::collections::BTreeMap;

/// Default number of octaves above the fundamental
pub const DEFAULT_OCTAVE_COUNT: u32 = 6;

/// Parameters for building a [`NoteFrequencyTable`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteTableConfig {
    /// Highest octave offset; labels run from 0 to `octave_count + 1`
    pub octave_count: u32,
    /// Uniform multiplier applied to every fundamental
    pub scale: f64,
    /// Semitones to emit
    pub included: NoteSet,
    /// Attach display styles to every entry
    pub with_styling: bool,
}

impl Default for NoteTableConfig {
    fn default() -> Self {
        Self {
            octave_count: DEFAULT_OCTAVE_COUNT,
            scale: 1.0,
            included: NoteSet::all(),
            with_styling: false,
        }
    }
}

impl NoteTableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn octave_count(mut self, octave_count: u32) -> Self {
        self.octave_count = octave_count;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn included(mut self, included: NoteSet) -> Self {
        self.included = included;
        self
    }

    pub fn with_styling(mut self, with_styling: bool) -> Self {
        self.with_styling = with_styling;
        self
    }
}

/// Frequency of an entry, with display metadata when the table is styled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteValue {
    Plain { frequency_hz: f64 },
    Styled { frequency_hz: f64, style: NoteStyle },
}

impl NoteValue {
    pub fn frequency_hz(&self) -> f64 {
        match self {
            NoteValue::Plain { frequency_hz } | NoteValue::Styled { frequency_hz, .. } => {
                *frequency_hz
            }
        }
    }

    pub fn style(&self) -> Option<NoteStyle> {
        match self {
            NoteValue::Plain { .. } => None,
            NoteValue::Styled { style, .. } => Some(*style),
        }
    }
}

/// A single (semitone, octave) entry of the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteFrequency {
    pub semitone: Semitone,
    /// Octave label number (also the power-of-two exponent)
    pub octave: u32,
    pub value: NoteValue,
}

impl NoteFrequency {
    /// Label such as "A4" or "Cs2"
    pub fn label(&self) -> String {
        format!("{}{}", self.semitone.label(), self.octave)
    }

    /// Frequency in the table's (scaled) units
    pub fn frequency_hz(&self) -> f64 {
        self.value.frequency_hz()
    }
}

/// Overlay line data for an external renderer
#[derive(Debug, Clone, PartialEq)]
pub struct NoteLine {
    pub label: String,
    pub frequency_hz: f64,
    pub color: Color,
    pub linestyle: LineStyle,
}

/// Note frequencies for every included semitone and octave
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFrequencyTable {
    entries: Vec<NoteFrequency>,
    styled: bool,
}

impl NoteFrequencyTable {
    /// Build the table
    ///
    /// Entries are ordered by octave, then by semitone within the octave.
    pub fn build(config: &NoteTableConfig) -> Result<Self> {
        if !config.scale.is_finite() || config.scale <= 0.0 {
            return Err(AnalysisError::config(format!(
                "scale must be a positive finite number, got {}",
                config.scale
            )));
        }

        let octaves = config.octave_count as usize + 2;
        let mut entries = Vec::with_capacity(octaves * config.included.len());

        for octave in 0..=config.octave_count + 1 {
            let multiplier = 2f64.powi(octave as i32);
            for semitone in config.included.iter() {
                let frequency_hz = semitone.fundamental_hz() * config.scale * multiplier;
                let value = if config.with_styling {
                    NoteValue::Styled {
                        frequency_hz,
                        style: semitone.style(),
                    }
                } else {
                    NoteValue::Plain { frequency_hz }
                };
                entries.push(NoteFrequency {
                    semitone,
                    octave,
                    value,
                });
            }
        }

        Ok(Self {
            entries,
            styled: config.with_styling,
        })
    }

    /// Entries in table order
    pub fn entries(&self) -> &[NoteFrequency] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_styled(&self) -> bool {
        self.styled
    }

    /// Look up an entry by label ("A4")
    pub fn get(&self, label: &str) -> Option<&NoteFrequency> {
        self.entries.iter().find(|e| e.label() == label)
    }

    /// Label to frequency mapping of an unstyled table
    pub fn frequencies(&self) -> Result<BTreeMap<String, f64>> {
        if self.styled {
            return Err(AnalysisError::config(
                "styling present: use note_lines() for a styled table",
            ));
        }
        Ok(self
            .entries
            .iter()
            .map(|e| (e.label(), e.frequency_hz()))
            .collect())
    }

    /// Overlay lines of a styled table
    pub fn note_lines(&self) -> Result<Vec<NoteLine>> {
        if !self.styled {
            return Err(AnalysisError::config(
                "styling required: build the table with with_styling(true)",
            ));
        }
        let lines = self
            .entries
            .iter()
            .filter_map(|e| {
                e.value.style().map(|style| NoteLine {
                    label: e.label(),
                    frequency_hz: e.frequency_hz(),
                    color: style.color,
                    linestyle: style.linestyle,
                })
            })
            .collect();
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn test_default_table_shape() {
        let table = NoteFrequencyTable::build(&NoteTableConfig::default()).unwrap();
        // Labels 0..=7, 12 notes each
        assert_eq!(table.len(), 8 * 12);
        assert!(!table.is_styled());
        assert!(table.get("C0").is_some());
        assert!(table.get("B7").is_some());
        assert!(table.get("C8").is_none());
    }

    #[test]
    fn test_label_zero_is_fundamental() {
        let table = NoteFrequencyTable::build(&NoteTableConfig::default()).unwrap();
        assert_eq!(table.get("C0").unwrap().frequency_hz(), 16.35);
        assert_eq!(table.get("A4").unwrap().frequency_hz(), 440.0);
        assert_eq!(table.entries()[0].label(), "C0");
        assert_eq!(table.entries()[12].label(), "C1");
    }

    #[test]
    fn test_scale_formula() {
        for scale in [0.2, 1.0, 3.7] {
            let config = NoteTableConfig::new().scale(scale).octave_count(4);
            let table = NoteFrequencyTable::build(&config).unwrap();
            for entry in table.entries() {
                let expected =
                    entry.semitone.fundamental_hz() * scale * 2f64.powi(entry.octave as i32);
                assert!(close(entry.frequency_hz(), expected), "{}", entry.label());
            }
        }
    }

    #[test]
    fn test_octave_doubling() {
        let table = NoteFrequencyTable::build(&NoteTableConfig::new().scale(0.37)).unwrap();
        for entry in table.entries() {
            let next = format!("{}{}", entry.semitone.label(), entry.octave + 1);
            if let Some(up) = table.get(&next) {
                assert!(close(up.frequency_hz(), 2.0 * entry.frequency_hz()));
            }
        }
    }

    #[test]
    fn test_included_subset() {
        let config = NoteTableConfig::new().included(NoteSet::c_major()).octave_count(0);
        let table = NoteFrequencyTable::build(&config).unwrap();
        assert_eq!(table.len(), 7 * 2);
        assert!(table.get("Cs1").is_none());
        assert!(table.get("E1").is_some());
    }

    #[test]
    fn test_empty_included() {
        let config = NoteTableConfig::new().included(NoteSet::empty());
        let table = NoteFrequencyTable::build(&config).unwrap();
        assert!(table.is_empty());
        assert!(table.frequencies().unwrap().is_empty());
    }

    #[test]
    fn test_zero_octaves() {
        let table = NoteFrequencyTable::build(&NoteTableConfig::new().octave_count(0)).unwrap();
        assert_eq!(table.len(), 24);
    }

    #[test]
    fn test_invalid_scale() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = NoteFrequencyTable::build(&NoteTableConfig::new().scale(scale));
            assert!(matches!(result, Err(AnalysisError::Configuration(_))));
        }
    }

    #[test]
    fn test_styled_lines() {
        let config = NoteTableConfig::new().with_styling(true).octave_count(1);
        let table = NoteFrequencyTable::build(&config).unwrap();
        let lines = table.note_lines().unwrap();
        assert_eq!(lines.len(), table.len());

        let a2 = lines.iter().find(|l| l.label == "A2").unwrap();
        assert_eq!(a2.frequency_hz, 110.0);
        assert_eq!(a2.color, Color::Magenta);
        assert_eq!(a2.linestyle, LineStyle::Solid);
    }

    #[test]
    fn test_styling_mismatch() {
        let plain = NoteFrequencyTable::build(&NoteTableConfig::default()).unwrap();
        let err = plain.note_lines().unwrap_err();
        assert!(err.to_string().contains("styling required"));

        let styled =
            NoteFrequencyTable::build(&NoteTableConfig::new().with_styling(true)).unwrap();
        assert!(matches!(
            styled.frequencies(),
            Err(AnalysisError::Configuration(_))
        ));
    }
}
