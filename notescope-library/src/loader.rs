//! Audio file loading and decoding

use notescope_analysis::{AnalysisError, AudioSource};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey};
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while loading a recording
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Unsupported(#[from] AnalysisError),
}

/// Decodes a mono audio file into an [`AudioSource`] using Symphonia
///
/// Samples are normalized to -1.0..1.0 regardless of the stored sample format.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioLoader;

impl AudioLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a file, titled from its track-title tag or else its file stem
    pub fn load(&self, path: &Path) -> Result<AudioSource, LoadError> {
        self.decode(path, None)
    }

    /// Load a file with an explicit title
    pub fn load_titled(&self, path: &Path, title: &str) -> Result<AudioSource, LoadError> {
        self.decode(path, Some(title))
    }

    fn decode(&self, path: &Path, title: Option<&str>) -> Result<AudioSource, LoadError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| LoadError::UnsupportedFormat("unknown sample rate".into()))?;
        ensure_mono(codec_params.channels.map(|c| c.count()).unwrap_or(1))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::UnsupportedFormat(e.to_string()))?;

        let title = match title {
            Some(t) => t.to_string(),
            None => self.extract_title(&mut format, path),
        };

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "stopping at unreadable packet");
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    warn!(error = %e, "skipping undecodable packet");
                    continue;
                }
            };

            let spec = *decoded.spec();
            // Some containers only report the layout once packets decode
            ensure_mono(spec.channels.count())?;
            let duration = decoded.capacity() as u64;

            let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        debug!(
            path = %path.display(),
            sample_rate,
            samples = samples.len(),
            "decoded recording"
        );

        Ok(AudioSource::new(sample_rate, samples, title)?)
    }

    fn extract_title(&self, format: &mut Box<dyn FormatReader>, path: &Path) -> String {
        let mut title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();

        if let Some(meta) = format.metadata().current() {
            for tag in meta.tags() {
                if let Some(StandardTagKey::TrackTitle) = tag.std_key {
                    title = tag.value.to_string();
                }
            }
        }

        title
    }
}

fn ensure_mono(channels: usize) -> Result<(), LoadError> {
    if channels != 1 {
        return Err(AnalysisError::UnsupportedInput(format!(
            "expected a single-channel recording, found {} channels",
            channels
        ))
        .into());
    }
    Ok(())
}
