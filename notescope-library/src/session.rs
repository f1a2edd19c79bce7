//! Analysis sessions with progress reporting
//!
//! A session owns one recording and its settings, computes the spectrogram,
//! builds the note overlay lines, and optionally runs the note-presence
//! query. It can run on the caller's thread or on a worker thread that
//! reports progress through a channel.

use crate::config::{AnalysisConfig, ConfigError};
use crate::loader::{AudioLoader, LoadError};
use crossbeam_channel::{self, Receiver, Sender};
use notescope_analysis::{
    AnalysisError, AudioSource, CancelToken, DetectedNote, NoteFrequencyTable, NoteLine,
    Spectrogram,
};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::info;

/// Progress updates during an analysis run
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisProgress {
    /// Analysis started
    Started {
        /// Number of windows to transform
        windows: usize,
    },
    /// A window finished transforming
    Window {
        /// Windows finished so far
        completed: usize,
        /// Total number of windows
        total: usize,
    },
    /// Analysis completed
    Complete {
        /// Frames in the spectrogram
        frames: usize,
        /// Notes reported present (0 when no threshold is configured)
        notes: usize,
    },
    /// Analysis was cancelled before completion
    Cancelled,
}

/// Error type for session operations
#[derive(Debug)]
pub enum SessionError {
    /// Loading the recording failed
    Load(LoadError),
    /// Reading the configuration failed
    Config(ConfigError),
    /// Analysis failed or was cancelled
    Analysis(AnalysisError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Load(e) => write!(f, "Load error: {}", e),
            SessionError::Config(e) => write!(f, "Config error: {}", e),
            SessionError::Analysis(e) => write!(f, "Analysis error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Load(e) => Some(e),
            SessionError::Config(e) => Some(e),
            SessionError::Analysis(e) => Some(e),
        }
    }
}

impl From<LoadError> for SessionError {
    fn from(e: LoadError) -> Self {
        SessionError::Load(e)
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        SessionError::Config(e)
    }
}

impl From<AnalysisError> for SessionError {
    fn from(e: AnalysisError) -> Self {
        SessionError::Analysis(e)
    }
}

/// Everything a renderer or caller needs from one run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Title of the analysed recording
    pub title: String,
    pub spectrogram: Spectrogram,
    /// Styled note lines for overlay annotation
    pub note_lines: Vec<NoteLine>,
    /// Present notes; None when no threshold was configured
    pub notes: Option<Vec<DetectedNote>>,
}

/// One recording plus the settings to analyse it with
pub struct AnalysisSession {
    source: Arc<AudioSource>,
    config: AnalysisConfig,
}

impl AnalysisSession {
    /// Create a session for an already-decoded recording
    pub fn new(source: AudioSource, config: AnalysisConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
        }
    }

    /// Load a recording from disk and create a session for it
    pub fn open(path: &Path, config: AnalysisConfig) -> Result<Self, SessionError> {
        let source = AudioLoader::new().load(path)?;
        Ok(Self::new(source, config))
    }

    /// Load both the recording and a key=value settings file
    pub fn open_with_config(audio_path: &Path, config_path: &Path) -> Result<Self, SessionError> {
        let config = AnalysisConfig::load_from(config_path)?;
        Self::open(audio_path, config)
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the analysis on the calling thread
    ///
    /// Sends progress updates through the channel when one is given.
    pub fn run(
        &self,
        progress_tx: Option<Sender<AnalysisProgress>>,
        cancel: &CancelToken,
    ) -> Result<AnalysisReport, SessionError> {
        let result = self.analyze(progress_tx.as_ref(), cancel);

        if let (Err(SessionError::Analysis(AnalysisError::Cancelled)), Some(tx)) =
            (&result, &progress_tx)
        {
            let _ = tx.send(AnalysisProgress::Cancelled);
        }

        result
    }

    /// Start the analysis on a worker thread
    ///
    /// Returns a receiver for progress updates, a token to cancel the run,
    /// and a handle to the worker thread.
    pub fn run_async(
        self,
    ) -> (
        Receiver<AnalysisProgress>,
        CancelToken,
        JoinHandle<Result<AnalysisReport, SessionError>>,
    ) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let handle = thread::spawn(move || self.run(Some(tx), &worker_cancel));

        (rx, cancel, handle)
    }

    fn analyze(
        &self,
        progress_tx: Option<&Sender<AnalysisProgress>>,
        cancel: &CancelToken,
    ) -> Result<AnalysisReport, SessionError> {
        let analyzer = self.config.analyzer()?;
        let window_samples = analyzer.checked_window_samples(self.source.sample_rate())?;
        let windows = self.source.samples().len() / window_samples;

        info!(
            title = self.source.title(),
            sample_rate = self.source.sample_rate(),
            windows,
            threads = analyzer.threads(),
            "analysis started"
        );
        if let Some(tx) = progress_tx {
            let _ = tx.send(AnalysisProgress::Started { windows });
        }

        let spectrogram = analyzer.compute_with(
            self.source.sample_rate(),
            self.source.samples(),
            cancel,
            &mut |completed, total| {
                if let Some(tx) = progress_tx {
                    let _ = tx.send(AnalysisProgress::Window { completed, total });
                }
            },
        )?;

        let note_lines =
            NoteFrequencyTable::build(&self.config.note_table_config())?.note_lines()?;

        let notes = match self.config.presence_query() {
            Some(query) => Some(query.run(&spectrogram)?),
            None => None,
        };
        let note_count = notes.as_ref().map_or(0, Vec::len);

        info!(
            title = self.source.title(),
            frames = spectrogram.frame_count(),
            notes = note_count,
            "analysis complete"
        );
        if let Some(tx) = progress_tx {
            let _ = tx.send(AnalysisProgress::Complete {
                frames: spectrogram.frame_count(),
                notes: note_count,
            });
        }

        Ok(AnalysisReport {
            title: self.source.title().to_string(),
            spectrogram,
            note_lines,
            notes,
        })
    }
}
