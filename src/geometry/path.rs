//! Sample sequence to 2-D path mapping.
//!
//! Spreads N samples evenly across normalized device x and maps each
//! amplitude byte to a y coordinate according to the sampling mode.

use serde::{Deserialize, Serialize};

use super::Point;

/// Which analyser output a frame was sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SamplingMode {
    /// Byte frequency magnitudes (0 = silence, 255 = loudest).
    #[default]
    Frequency,
    /// Byte waveform samples centered on 128.
    TimeDomain,
}

impl SamplingMode {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "frequency" | "freq" | "spectrum" => Some(Self::Frequency),
            "time-domain" | "timedomain" | "time" | "waveform" => Some(Self::TimeDomain),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::TimeDomain => "time-domain",
        }
    }
}

/// Vertical mapping constants.
///
/// These are display tuning values, not algorithmic constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathMapping {
    /// Frequency mode: `y = frequency_scale * s / 255 - frequency_offset`.
    pub frequency_scale: f32,
    pub frequency_offset: f32,
    /// Time-domain mode: `y = time_domain_scale * (s - 128) / 128`.
    pub time_domain_scale: f32,
}

impl Default for PathMapping {
    fn default() -> Self {
        Self {
            frequency_scale: 1.8,
            frequency_offset: 0.9,
            time_domain_scale: 0.9,
        }
    }
}

/// Maps byte samples to points in normalized device coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathBuilder {
    mapping: PathMapping,
}

impl PathBuilder {
    pub fn new(mapping: PathMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &PathMapping {
        &self.mapping
    }

    /// Map a single sample byte to its y coordinate.
    #[inline]
    pub fn map_y(&self, sample: u8, mode: SamplingMode) -> f32 {
        let s = sample as f32;
        match mode {
            SamplingMode::Frequency => {
                self.mapping.frequency_scale * s / 255.0 - self.mapping.frequency_offset
            }
            SamplingMode::TimeDomain => self.mapping.time_domain_scale * (s - 128.0) / 128.0,
        }
    }

    /// Build the path into `out`, reusing its allocation.
    pub fn build_into(&self, samples: &[u8], mode: SamplingMode, out: &mut Vec<Point>) {
        out.clear();
        let n = samples.len() as f32;
        out.extend(
            samples
                .iter()
                .enumerate()
                .map(|(i, &s)| [2.0 * i as f32 / n - 1.0, self.map_y(s, mode)]),
        );
    }

    /// Build a freshly allocated path.
    pub fn build(&self, samples: &[u8], mode: SamplingMode) -> Vec<Point> {
        let mut path = Vec::with_capacity(samples.len());
        self.build_into(samples, mode, &mut path);
        path
    }
}
