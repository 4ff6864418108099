//! Byte-valued spectrum and waveform analyser.
//!
//! Mirrors the behaviour of a browser analyser node: a Blackman-windowed FFT
//! over the most recent `fft_size` samples, exponential smoothing across
//! calls, and a decibel range mapped linearly onto `0..=255`.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;

/// Errors raised when an analyser is configured.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnalyserError {
    #[error("FFT size must be a power of 2 between 32 and 32768, got {0}")]
    InvalidFftSize(usize),
    #[error("Decibel range is empty: min {min} >= max {max}")]
    InvalidDecibelRange { min: f32, max: f32 },
    #[error("Smoothing must be within 0.0..=1.0, got {0}")]
    InvalidSmoothing(f32),
}

/// Analyser settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    pub fft_size: usize,
    /// Weight of the previous frame's magnitudes (0.0 = no smoothing).
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    pub fn validate(&self) -> Result<(), AnalyserError> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(AnalyserError::InvalidFftSize(self.fft_size));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(AnalyserError::InvalidDecibelRange {
                min: self.min_decibels,
                max: self.max_decibels,
            });
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(AnalyserError::InvalidSmoothing(self.smoothing));
        }
        Ok(())
    }

    /// Number of frequency bins produced per frame.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

/// Streaming analyser producing byte frequency and time-domain data.
pub struct ByteAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    history: Vec<f32>,
    write_pos: usize,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl ByteAnalyser {
    pub fn new(config: AnalyserConfig) -> Result<Self, AnalyserError> {
        config.validate()?;
        let n = config.fft_size;

        let fft = FftPlanner::new().plan_fft_forward(n);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        // Blackman window
        let window = (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * t).cos() + 0.08 * (4.0 * PI * t).cos()
            })
            .collect();

        Ok(Self {
            config,
            fft,
            window,
            history: vec![0.0; n],
            write_pos: 0,
            spectrum: vec![Complex::new(0.0, 0.0); n],
            scratch,
            smoothed: vec![0.0; n / 2],
        })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.config.frequency_bin_count()
    }

    /// Append PCM samples to the analysis window.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let n = self.history.len();
        // Only the last `n` samples can ever be observed.
        let samples = &samples[samples.len().saturating_sub(n)..];
        for &s in samples {
            self.history[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % n;
        }
    }

    /// Append `count` zero samples.
    pub fn push_silence(&mut self, count: usize) {
        let n = self.history.len();
        for _ in 0..count.min(n) {
            self.history[self.write_pos] = 0.0;
            self.write_pos = (self.write_pos + 1) % n;
        }
    }

    /// Clear the window and the smoothing state.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.smoothed.fill(0.0);
        self.write_pos = 0;
    }

    /// Sample `k` of the window in chronological order.
    #[inline]
    fn ordered(&self, k: usize) -> f32 {
        self.history[(self.write_pos + k) % self.history.len()]
    }

    /// Fill `out` with byte frequency magnitudes.
    ///
    /// Writes `min(out.len(), frequency_bin_count)` bytes; each call advances
    /// the smoothing state by one frame.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let n = self.config.fft_size;
        for k in 0..n {
            self.spectrum[k] = Complex::new(self.ordered(k) * self.window[k], 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let tau = self.config.smoothing;
        let min_db = self.config.min_decibels;
        let range = self.config.max_decibels - min_db;
        let bins = self.smoothed.len();

        for k in 0..bins {
            let magnitude = self.spectrum[k].norm() / n as f32;
            let value = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            self.smoothed[k] = if value.is_finite() { value } else { 0.0 };
        }

        for (byte, &value) in out.iter_mut().zip(&self.smoothed) {
            *byte = if value > 0.0 {
                let db = 20.0 * value.log10();
                (255.0 * (db - min_db) / range).floor().clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }

    /// Fill `out` with the most recent samples as bytes centered on 128.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let n = self.history.len();
        let len = out.len().min(n);
        let start = n - len;
        for (i, byte) in out.iter_mut().take(len).enumerate() {
            let x = self.ordered(start + i);
            *byte = (128.0 * (1.0 + x)).floor().clamp(0.0, 255.0) as u8;
        }
    }
}
