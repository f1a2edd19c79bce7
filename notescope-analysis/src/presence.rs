//! Threshold-based note presence
//!
//! Rescales the note table into bin units (`scale = 1 / bin_width_hz`, the
//! spacing of the spectrogram's frequency axis), truncates each note to a
//! bin and reports the note when the peak power in that bin over all frames
//! exceeds the threshold. This is a single-bin heuristic: no loudness
//! normalization and no harmonic disambiguation.

use crate::error::{AnalysisError, Result};
use crate::notes::{NoteFrequencyTable, NoteTableConfig, DEFAULT_OCTAVE_COUNT};
use crate::semitone::{NoteSet, Semitone};
use crate::spectrogram::Spectrogram;
use tracing::{debug, trace};

/// A note whose bin exceeded the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedNote {
    /// Label such as "A4"
    pub label: String,
    pub semitone: Semitone,
    pub octave: u32,
    /// Frame bin the note was read from
    pub bin: usize,
    /// Highest power at `bin` across all frames
    pub peak_power: f64,
}

/// A note frequency that does not map to a bin of the spectrogram
#[derive(Debug, Clone, Copy)]
struct OutOfRangeBin {
    position: f64,
    frame_len: usize,
}

fn bin_index(position: f64, frame_len: usize) -> std::result::Result<usize, OutOfRangeBin> {
    let out_of_range = OutOfRangeBin {
        position,
        frame_len,
    };
    if !position.is_finite() || position < 0.0 {
        return Err(out_of_range);
    }
    let bin = position.trunc() as usize;
    if bin >= frame_len {
        return Err(out_of_range);
    }
    Ok(bin)
}

/// Note-presence query parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotePresenceQuery {
    /// Peak power a note's bin must exceed
    pub threshold: f64,
    pub octave_count: u32,
    pub included: NoteSet,
}

impl NotePresenceQuery {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            octave_count: DEFAULT_OCTAVE_COUNT,
            included: NoteSet::all(),
        }
    }

    pub fn octave_count(mut self, octave_count: u32) -> Self {
        self.octave_count = octave_count;
        self
    }

    pub fn included(mut self, included: NoteSet) -> Self {
        self.included = included;
        self
    }

    /// Notes present in `spectrogram`, in table order
    pub fn run(&self, spectrogram: &Spectrogram) -> Result<Vec<DetectedNote>> {
        if self.threshold.is_nan() {
            return Err(AnalysisError::config("threshold must not be NaN"));
        }

        let bin_width = spectrogram.bin_width_hz();
        let config = NoteTableConfig::new()
            .octave_count(self.octave_count)
            .scale(1.0 / bin_width)
            .included(self.included);
        let table = NoteFrequencyTable::build(&config)?;
        let frame_len = spectrogram.frame_len();

        let mut present = Vec::new();
        for entry in table.entries() {
            let bin = match bin_index(entry.frequency_hz(), frame_len) {
                Ok(bin) => bin,
                Err(OutOfRangeBin {
                    position,
                    frame_len,
                }) => {
                    trace!(note = %entry.label(), position, frame_len, "note outside spectrogram");
                    continue;
                }
            };

            let Some(peak_power) = spectrogram.peak_in_bin(bin) else {
                continue;
            };
            if peak_power > self.threshold {
                present.push(DetectedNote {
                    label: entry.label(),
                    semitone: entry.semitone,
                    octave: entry.octave,
                    bin,
                    peak_power,
                });
            }
        }

        debug!(
            candidates = table.len(),
            present = present.len(),
            threshold = self.threshold,
            "note presence query"
        );
        Ok(present)
    }
}

/// Notes present using the default octave span and every semitone
pub fn notes_present(spectrogram: &Spectrogram, threshold: f64) -> Result<Vec<DetectedNote>> {
    NotePresenceQuery::new(threshold).run(spectrogram)
}
