//! Short-time power spectrum over consecutive rectangular windows
//!
//! The recording is cut into non-overlapping windows of
//! `sample_rate / frequency_resolution` samples; a trailing partial window is
//! dropped. Each window goes through a plain DFT (no taper, no
//! normalization) and keeps the squared magnitude of the non-negative
//! frequency half.
//!
//! The frequency axis labels bin `i` as `i * 2 * frequency_resolution` Hz.
//! That is twice the physical bin centre (`i * sample_rate / window_samples`),
//! so notes read against the axis come out one octave above the physical
//! pitch: a 440 Hz tone is reported as A5. Note labels and overlays depend on
//! this axis; `resolution_hz` gives the physical spacing.

use crate::error::{AnalysisError, Result};
use crate::source::{AudioSource, CancelToken};
use rustfft::{num_complex::Complex, Fft, FftPlanner, Length};
use std::sync::Arc;
use tracing::debug;

/// Default frequency resolution (windows per second)
pub const DEFAULT_FREQUENCY_RESOLUTION: u32 = 5;

/// Power per frequency bin for one window
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrame {
    powers: Vec<f64>,
}

impl SpectralFrame {
    /// Power values, indexed by bin
    pub fn powers(&self) -> &[f64] {
        &self.powers
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    pub fn get(&self, bin: usize) -> Option<f64> {
        self.powers.get(bin).copied()
    }
}

/// Frames in time order plus their shared frequency axis
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    frames: Vec<SpectralFrame>,
    frequencies: Vec<f64>,
    sample_rate: u32,
    window_samples: usize,
    frequency_resolution: u32,
}

impl Spectrogram {
    pub fn frames(&self) -> &[SpectralFrame] {
        &self.frames
    }

    /// Axis value of each bin, `i * 2 * frequency_resolution`, starting at 0
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per analysis window
    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Bins per frame (`window_samples / 2`)
    pub fn frame_len(&self) -> usize {
        self.frequencies.len()
    }

    /// Windows per second the spectrogram was built with
    pub fn frequency_resolution(&self) -> u32 {
        self.frequency_resolution
    }

    /// Spacing between neighbouring axis values (`freq[1] - freq[0]`)
    ///
    /// Defined from the resolution so it exists even when a frame has fewer than two bins.
    pub fn bin_width_hz(&self) -> f64 {
        2.0 * self.frequency_resolution as f64
    }

    /// Physical spacing between bins in Hz (`sample_rate / window_samples`)
    pub fn resolution_hz(&self) -> f64 {
        self.sample_rate as f64 / self.window_samples as f64
    }

    /// Length of audio covered by the frames
    pub fn duration_secs(&self) -> f64 {
        (self.frames.len() * self.window_samples) as f64 / self.sample_rate as f64
    }

    /// Power at one bin across all frames
    pub fn column(&self, bin: usize) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().filter_map(move |f| f.get(bin))
    }

    /// Highest power seen at `bin`, or None if out of range or there are no frames
    pub fn peak_in_bin(&self, bin: usize) -> Option<f64> {
        if bin >= self.frame_len() {
            return None;
        }
        self.column(bin).fold(None, |peak, p| match peak {
            Some(max) if max >= p => Some(max),
            _ => Some(p),
        })
    }

    /// Highest power anywhere in the spectrogram
    pub fn max_power(&self) -> Option<f64> {
        self.frames
            .iter()
            .flat_map(|f| f.powers.iter().copied())
            .fold(None, |peak, p| match peak {
                Some(max) if max >= p => Some(max),
                _ => Some(p),
            })
    }
}

/// Rectangular-window spectrogram builder
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    frequency_resolution: u32,
    threads: usize,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self {
            frequency_resolution: DEFAULT_FREQUENCY_RESOLUTION,
            threads: 1,
        }
    }
}

impl SpectralAnalyzer {
    /// Create an analyzer producing `frequency_resolution` windows per second
    pub fn new(frequency_resolution: u32) -> Result<Self> {
        if frequency_resolution == 0 {
            return Err(AnalysisError::config("frequency resolution must be positive"));
        }
        Ok(Self {
            frequency_resolution,
            threads: 1,
        })
    }

    /// Spread the per-window transforms over `threads` workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn frequency_resolution(&self) -> u32 {
        self.frequency_resolution
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Samples per window at the given sample rate
    pub fn window_samples(&self, sample_rate: u32) -> usize {
        (sample_rate / self.frequency_resolution) as usize
    }

    /// Samples per window, rejecting a zero sample rate or an empty window
    pub fn checked_window_samples(&self, sample_rate: u32) -> Result<usize> {
        if sample_rate == 0 {
            return Err(AnalysisError::input("sample rate must be positive"));
        }
        match self.window_samples(sample_rate) {
            0 => Err(AnalysisError::config(format!(
                "frequency resolution {} exceeds sample rate {}",
                self.frequency_resolution, sample_rate
            ))),
            window_samples => Ok(window_samples),
        }
    }

    /// Spectrogram of a validated source
    pub fn compute_spectrogram(&self, source: &AudioSource) -> Result<Spectrogram> {
        self.compute_samples(source.sample_rate(), source.samples())
    }

    /// Spectrogram of raw samples; an empty slice gives zero frames
    pub fn compute_samples(&self, sample_rate: u32, samples: &[f32]) -> Result<Spectrogram> {
        self.compute_with(sample_rate, samples, &CancelToken::new(), &mut |_, _| {})
    }

    /// Spectrogram with cancellation and per-window progress
    ///
    /// `on_window(completed, total)` runs on the calling thread after each
    /// finished window. Cancellation is checked between windows and discards
    /// everything computed so far.
    pub fn compute_with(
        &self,
        sample_rate: u32,
        samples: &[f32],
        cancel: &CancelToken,
        on_window: &mut dyn FnMut(usize, usize),
    ) -> Result<Spectrogram> {
        let window_samples = self.checked_window_samples(sample_rate)?;
        let window_count = samples.len() / window_samples;
        let retained = window_samples / 2;
        debug!(sample_rate, window_samples, window_count, retained, "computing spectrogram");

        let fft = FftPlanner::<f64>::new().plan_fft_forward(window_samples);
        let windows: Vec<&[f32]> = samples.chunks_exact(window_samples).collect();

        let frames = if self.threads > 1 && window_count > 1 {
            transform_parallel(&fft, &windows, retained, self.threads, cancel, on_window)?
        } else {
            transform_sequential(fft.as_ref(), &windows, retained, cancel, on_window)?
        };

        let spacing = 2.0 * self.frequency_resolution as f64;
        let frequencies = (0..retained).map(|i| i as f64 * spacing).collect();

        Ok(Spectrogram {
            frames,
            frequencies,
            sample_rate,
            window_samples,
            frequency_resolution: self.frequency_resolution,
        })
    }
}

/// Transform one window into its retained power spectrum
///
/// Power is `norm_sqr`, i.e. the real part of `c * conj(c)`, which is never negative.
fn transform_window(
    fft: &dyn Fft<f64>,
    window: &[f32],
    retained: usize,
    buffer: &mut Vec<Complex<f64>>,
) -> SpectralFrame {
    buffer.clear();
    buffer.extend(window.iter().map(|&s| Complex::new(s as f64, 0.0)));
    fft.process(buffer);

    SpectralFrame {
        powers: buffer[..retained].iter().map(|c| c.norm_sqr()).collect(),
    }
}

fn transform_sequential(
    fft: &dyn Fft<f64>,
    windows: &[&[f32]],
    retained: usize,
    cancel: &CancelToken,
    on_window: &mut dyn FnMut(usize, usize),
) -> Result<Vec<SpectralFrame>> {
    let total = windows.len();
    let mut buffer = Vec::with_capacity(fft.len());
    let mut frames = Vec::with_capacity(total);

    for window in windows {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        frames.push(transform_window(fft, window, retained, &mut buffer));
        on_window(frames.len(), total);
    }

    Ok(frames)
}

/// Workers pull window indices from a queue; each frame lands in its own slot
fn transform_parallel(
    fft: &Arc<dyn Fft<f64>>,
    windows: &[&[f32]],
    retained: usize,
    threads: usize,
    cancel: &CancelToken,
    on_window: &mut dyn FnMut(usize, usize),
) -> Result<Vec<SpectralFrame>> {
    let total = windows.len();
    let thread_count = threads.min(total).max(1);

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<usize>();
    for idx in 0..total {
        if job_tx.send(idx).is_err() {
            break;
        }
    }
    drop(job_tx);

    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, SpectralFrame)>();
    let mut slots: Vec<Option<SpectralFrame>> = (0..total).map(|_| None).collect();

    std::thread::scope(|scope| {
        for _ in 0..thread_count {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let fft = Arc::clone(fft);

            scope.spawn(move || {
                let mut buffer = Vec::with_capacity(fft.len());
                for idx in job_rx.iter() {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let frame = transform_window(fft.as_ref(), windows[idx], retained, &mut buffer);
                    if result_tx.send((idx, frame)).is_err() {
                        break;
                    }
                }
            });
        }
        // Workers hold the remaining senders; the loop ends once they all exit
        drop(result_tx);

        let mut completed = 0;
        for (idx, frame) in result_rx.iter() {
            slots[idx] = Some(frame);
            completed += 1;
            on_window(completed, total);
        }
    });

    if cancel.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }

    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(AnalysisError::Cancelled)
}
