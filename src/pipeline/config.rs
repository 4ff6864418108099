//! Visualizer configuration loaded from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::{AnalyserConfig, AnalyserError};
use crate::controls::ViewControls;
use crate::geometry::{GeometryConfig, SamplingMode};
use crate::gpu::RenderConfig;

/// Errors raised while loading or validating a [`VisualizerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid background color `{0}`")]
    InvalidColor(String),
    #[error("Output size must be non-zero, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Frame rate must be non-zero")]
    InvalidFps,
    #[error(transparent)]
    Analyser(#[from] AnalyserError),
}

/// Parse hex color to RGB floats (accepts 6-char RGB or 8-char RGBA, alpha is ignored).
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let hex = hex.trim_start_matches('#');
    if (hex.len() != 6 && hex.len() != 8) || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
    Some([r, g, b])
}

/// Everything needed to run a visualizer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub fft_size: usize,
    pub smoothing: f32,
    pub mode: SamplingMode,
    /// Hex color, e.g. `#101018`.
    pub background: String,
    pub thickness: f32,
    pub polar: bool,
    pub geometry: GeometryConfig,
    /// Write a snapshot every this many frames (offline rendering).
    pub snapshot_every: u32,
    pub looping: bool,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 60,
            fft_size: 2048,
            smoothing: 0.8,
            mode: SamplingMode::Frequency,
            background: "#000000".to_string(),
            thickness: 0.02,
            polar: false,
            geometry: GeometryConfig::default(),
            snapshot_every: 30,
            looping: false,
        }
    }
}

impl VisualizerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.fps == 0 {
            return Err(ConfigError::InvalidFps);
        }
        self.background_rgb()?;
        self.analyser_config().validate()?;
        Ok(())
    }

    pub fn background_rgb(&self) -> Result<[f32; 3], ConfigError> {
        parse_hex_color(&self.background)
            .ok_or_else(|| ConfigError::InvalidColor(self.background.clone()))
    }

    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            fft_size: self.fft_size,
            smoothing: self.smoothing,
            ..Default::default()
        }
    }

    pub fn render_config(&self) -> Result<RenderConfig, ConfigError> {
        Ok(RenderConfig {
            width: self.width,
            height: self.height,
            background: self.background_rgb()?,
        })
    }

    /// Initial view state: flat, sized to the output.
    pub fn view_controls(&self) -> ViewControls {
        ViewControls {
            thickness: self.thickness,
            aspect: self.width as f32 / self.height.max(1) as f32,
            polar: self.polar,
            ..Default::default()
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}
