//! Spectral analysis for notescope
//!
//! Provides the rectangular-window spectrogram, the equal-tempered note
//! frequency table, and threshold-based note presence detection.

mod error;
mod notes;
mod presence;
mod semitone;
mod source;
mod spectrogram;

pub use error::{AnalysisError, Result};
pub use notes::{
    NoteFrequency, NoteFrequencyTable, NoteLine, NoteTableConfig, NoteValue, DEFAULT_OCTAVE_COUNT,
};
pub use presence::{notes_present, DetectedNote, NotePresenceQuery};
pub use semitone::{fundamental_frequencies, Color, LineStyle, NoteSet, NoteStyle, Semitone};
pub use source::{AudioSource, CancelToken};
pub use spectrogram::{SpectralAnalyzer, SpectralFrame, Spectrogram, DEFAULT_FREQUENCY_RESOLUTION};
