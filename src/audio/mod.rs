//! Audio sources that feed the ribbon.
//!
//! This module provides:
//! - [`SampleSource`]: the per-frame byte sample provider consumed by the render loop
//! - [`ByteAnalyser`]: windowed FFT producing byte spectrum and waveform data
//! - [`PcmSource`]: decoded PCM played through an analyser on the frame clock
//! - Audio file loading via Symphonia (WAV, MP3, FLAC, AAC)
//! - Synthetic test signals

pub mod analyser;
pub mod loader;
pub mod source;
pub mod synth;

use std::time::Duration;

pub use crate::geometry::SamplingMode;
pub use analyser::{AnalyserConfig, AnalyserError, ByteAnalyser};
pub use loader::{load_audio, AudioData, AudioError};
pub use source::PcmSource;
pub use synth::{generate_sine, generate_sweep, generate_white_noise, write_wav};

/// A provider of byte-valued audio samples, one buffer per frame.
///
/// `buffer_length` must stay fixed for the lifetime of the source; it sets the
/// point count of the ribbon.
pub trait SampleSource {
    /// Number of samples written per frame.
    fn buffer_length(&self) -> usize;

    /// Fill `buffer` with frequency magnitudes in `0..=255`.
    fn frequency_samples(&mut self, buffer: &mut [u8]);

    /// Fill `buffer` with the waveform, centered on 128.
    fn time_domain_samples(&mut self, buffer: &mut [u8]);

    /// Move playback forward by one frame interval.
    fn advance(&mut self, _elapsed: Duration) {}

    /// Fill `buffer` using the given sampling mode.
    fn fill(&mut self, mode: SamplingMode, buffer: &mut [u8]) {
        match mode {
            SamplingMode::Frequency => self.frequency_samples(buffer),
            SamplingMode::TimeDomain => self.time_domain_samples(buffer),
        }
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn buffer_length(&self) -> usize {
        (**self).buffer_length()
    }

    fn frequency_samples(&mut self, buffer: &mut [u8]) {
        (**self).frequency_samples(buffer)
    }

    fn time_domain_samples(&mut self, buffer: &mut [u8]) {
        (**self).time_domain_samples(buffer)
    }

    fn advance(&mut self, elapsed: Duration) {
        (**self).advance(elapsed)
    }

    fn fill(&mut self, mode: SamplingMode, buffer: &mut [u8]) {
        (**self).fill(mode, buffer)
    }
}
