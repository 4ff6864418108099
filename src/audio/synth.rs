//! Synthetic audio for demos and tests.
//!
//! Generates sine tones, frequency sweeps and white noise, and writes them as
//! 16-bit mono WAV files that the loader can read back.

use std::f32::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn sample_count(sample_rate: u32, duration: f32) -> usize {
    (duration.max(0.0) * sample_rate as f32) as usize
}

/// Generate a sine wave.
///
/// # Arguments
/// * `frequency` - Frequency in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `duration` - Duration in seconds
/// * `amplitude` - Amplitude (0.0 to 1.0)
pub fn generate_sine(frequency: f32, sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    (0..sample_count(sample_rate, duration))
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Generate a linear sine sweep from `start_hz` to `end_hz`.
pub fn generate_sweep(
    start_hz: f32,
    end_hz: f32,
    sample_rate: u32,
    duration: f32,
    amplitude: f32,
) -> Vec<f32> {
    let count = sample_count(sample_rate, duration);
    let rate = sample_rate as f32;
    let mut phase = 0.0f32;

    (0..count)
        .map(|i| {
            let progress = i as f32 / count.max(1) as f32;
            let freq = start_hz + (end_hz - start_hz) * progress;
            let sample = amplitude * phase.sin();
            phase = (phase + 2.0 * PI * freq / rate) % (2.0 * PI);
            sample
        })
        .collect()
}

/// Generate white noise.
///
/// Uses a linear congruential generator so a seed always yields the same signal.
pub fn generate_white_noise(
    sample_rate: u32,
    duration: f32,
    amplitude: f32,
    seed: u64,
) -> Vec<f32> {
    let mut state = seed;
    const A: u64 = 6364136223846793005;
    const C: u64 = 1442695040888963407;

    (0..sample_count(sample_rate, duration))
        .map(|_| {
            state = state.wrapping_mul(A).wrapping_add(C);
            // Top 24 bits give an exact f32 in [0, 1).
            let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
            amplitude * (unit * 2.0 - 1.0)
        })
        .collect()
}

/// Write mono samples as a 16-bit PCM WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(path.as_ref())?);

    let data_size = samples.len() as u32 * 2;
    let byte_rate = sample_rate * 2;

    // RIFF header
    file.write_all(b"RIFF")?;
    file.write_all(&(36 + data_size).to_le_bytes())?;
    file.write_all(b"WAVE")?;

    // fmt chunk
    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?;
    file.write_all(&1u16.to_le_bytes())?; // PCM
    file.write_all(&1u16.to_le_bytes())?; // mono
    file.write_all(&sample_rate.to_le_bytes())?;
    file.write_all(&byte_rate.to_le_bytes())?;
    file.write_all(&2u16.to_le_bytes())?; // block align
    file.write_all(&16u16.to_le_bytes())?;

    // data chunk
    file.write_all(b"data")?;
    file.write_all(&data_size.to_le_bytes())?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        file.write_all(&value.to_le_bytes())?;
    }

    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sine() {
        let samples = generate_sine(440.0, 44100, 1.0, 0.5);
        assert_eq!(samples.len(), 44100);

        let max = samples.iter().cloned().fold(0.0f32, f32::max);
        assert!((max - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_generate_sweep_stays_in_range() {
        let samples = generate_sweep(100.0, 4000.0, 16000, 0.5, 0.7);
        assert_eq!(samples.len(), 8000);
        assert!(samples.iter().all(|s| s.abs() <= 0.7 + 1e-6));
    }

    #[test]
    fn test_generate_white_noise() {
        let samples = generate_white_noise(44100, 1.0, 1.0, 12345);
        assert_eq!(samples.len(), 44100);

        let has_positive = samples.iter().any(|&s| s > 0.0);
        let has_negative = samples.iter().any(|&s| s < 0.0);
        assert!(has_positive && has_negative);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_white_noise_is_reproducible() {
        let a = generate_white_noise(8000, 0.1, 1.0, 7);
        let b = generate_white_noise(8000, 0.1, 1.0, 7);
        let c = generate_white_noise(8000, 0.1, 1.0, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_write_wav_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, &[0.0, 1.0, -1.0], 8000).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44 + 6);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), i16::MAX);
    }
}
