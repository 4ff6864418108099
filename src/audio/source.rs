//! Decoded PCM played through a [`ByteAnalyser`] on the frame clock.

use std::time::Duration;

use super::analyser::{AnalyserConfig, AnalyserError, ByteAnalyser};
use super::loader::AudioData;
use super::SampleSource;

/// Plays mono PCM into an analyser as frames advance.
///
/// Past the end of the signal the analyser is fed silence, unless looping is
/// enabled, in which case playback wraps to the start.
pub struct PcmSource {
    samples: Vec<f32>,
    sample_rate: u32,
    cursor: usize,
    /// Fractional sample carried between ticks so playback does not drift.
    carry: f64,
    looping: bool,
    analyser: ByteAnalyser,
}

impl PcmSource {
    pub fn new(
        samples: Vec<f32>,
        sample_rate: u32,
        config: AnalyserConfig,
    ) -> Result<Self, AnalyserError> {
        Ok(Self {
            samples,
            sample_rate,
            cursor: 0,
            carry: 0.0,
            looping: false,
            analyser: ByteAnalyser::new(config)?,
        })
    }

    /// Downmix decoded audio and wrap it in a source.
    pub fn from_audio(audio: &AudioData, config: AnalyserConfig) -> Result<Self, AnalyserError> {
        Self::new(audio.to_mono(), audio.sample_rate, config)
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn analyser(&self) -> &ByteAnalyser {
        &self.analyser
    }

    /// Playback position.
    pub fn position(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.cursor as f64 / self.sample_rate as f64)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// True once a non-looping source has played all of its samples.
    pub fn is_finished(&self) -> bool {
        !self.looping && self.cursor >= self.samples.len()
    }

    /// Feed the next `count` samples of playback into the analyser.
    fn feed(&mut self, mut count: usize) {
        let window = self.analyser.fft_size();
        let len = self.samples.len();

        // Samples older than one window never reach the output.
        if count > window {
            let skip = count - window;
            self.cursor = if self.looping && len > 0 {
                (self.cursor + skip) % len
            } else {
                (self.cursor + skip).min(len)
            };
            count = window;
        }

        while count > 0 {
            if self.cursor < len {
                let take = count.min(len - self.cursor);
                self.analyser
                    .push_samples(&self.samples[self.cursor..self.cursor + take]);
                self.cursor += take;
                count -= take;
            } else if self.looping && len > 0 {
                self.cursor = 0;
            } else {
                self.analyser.push_silence(count);
                count = 0;
            }
        }
    }
}

impl SampleSource for PcmSource {
    fn buffer_length(&self) -> usize {
        self.analyser.frequency_bin_count()
    }

    fn frequency_samples(&mut self, buffer: &mut [u8]) {
        self.analyser.byte_frequency_data(buffer);
    }

    fn time_domain_samples(&mut self, buffer: &mut [u8]) {
        self.analyser.byte_time_domain_data(buffer);
    }

    fn advance(&mut self, elapsed: Duration) {
        let exact = elapsed.as_secs_f64() * self.sample_rate as f64 + self.carry;
        let count = exact.floor();
        self.carry = exact - count;
        self.feed(count as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::generate_sine;

    fn small_config() -> AnalyserConfig {
        AnalyserConfig {
            fft_size: 256,
            ..Default::default()
        }
    }

    #[test]
    fn test_buffer_length_matches_bins() {
        let source = PcmSource::new(vec![0.0; 100], 8000, small_config()).unwrap();
        assert_eq!(source.buffer_length(), 128);
    }

    #[test]
    fn test_advance_moves_cursor_by_elapsed_time() {
        let mut source = PcmSource::new(vec![0.0; 8000], 8000, small_config()).unwrap();
        source.advance(Duration::from_millis(10));
        assert_eq!(source.cursor, 80);
        assert_eq!(source.position(), Duration::from_millis(10));
    }

    #[test]
    fn test_fractional_samples_accumulate() {
        let mut source = PcmSource::new(vec![0.0; 44100], 44100, small_config()).unwrap();
        for _ in 0..60 {
            source.advance(Duration::from_secs_f64(1.0 / 60.0));
        }
        // One second of playback, within a sample of rounding.
        assert!((source.cursor as i64 - 44100).abs() <= 1, "cursor {}", source.cursor);
    }

    #[test]
    fn test_finishes_without_looping() {
        let mut source = PcmSource::new(vec![0.5; 100], 1000, small_config()).unwrap();
        source.advance(Duration::from_secs(1));
        assert!(source.is_finished());

        // Silence after the end keeps the waveform centered.
        source.advance(Duration::from_secs(1));
        let mut out = vec![0u8; 128];
        source.time_domain_samples(&mut out);
        assert!(out.iter().all(|&b| b == 128));
    }

    #[test]
    fn test_looping_wraps() {
        let mut source = PcmSource::new(vec![0.5; 100], 1000, small_config())
            .unwrap()
            .with_looping(true);
        source.advance(Duration::from_millis(150));
        assert!(!source.is_finished());
        assert_eq!(source.cursor, 50);
    }

    #[test]
    fn test_tone_produces_frequency_energy() {
        let tone = generate_sine(1000.0, 8000, 1.0, 0.8);
        let mut source = PcmSource::new(tone, 8000, small_config()).unwrap();
        source.advance(Duration::from_millis(100));

        let mut out = vec![0u8; source.buffer_length()];
        source.fill(crate::geometry::SamplingMode::Frequency, &mut out);
        assert!(out.iter().any(|&b| b > 0));
    }
}
