//! Full render pipeline combining audio, geometry and GPU.

mod config;
mod frame_loop;
mod producer;

pub use config::{parse_hex_color, ConfigError, VisualizerConfig};
pub use frame_loop::{
    FixedRateClock, FrameClock, FrameControl, FrameLoop, FrameTick, RealtimeClock, StopHandle,
};
pub use producer::{FrameProducer, Visualizer};

use std::path::{Path, PathBuf};

use crate::audio::{load_audio, AnalyserError, AudioError, PcmSource};
use crate::geometry::GeometryError;
use crate::gpu::{CaptureError, SetupError, UniformError};

/// Errors that can occur during pipeline execution.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("Analyser error: {0}")]
    Analyser(#[from] AnalyserError),
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("GPU setup error: {0}")]
    Setup(#[from] SetupError),
    #[error("Uniform error: {0}")]
    Uniform(#[from] UniformError),
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Captured frame does not match the output size")]
    FrameSize,
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a visualizer that plays `audio_path` through an analyser.
pub async fn open_audio<P: AsRef<Path>>(
    audio_path: P,
    config: &VisualizerConfig,
) -> Result<Visualizer<PcmSource>, PipelineError> {
    config.validate()?;
    let audio = load_audio(audio_path.as_ref())?;
    let source = PcmSource::from_audio(&audio, config.analyser_config())?.with_looping(config.looping);

    Visualizer::new(
        source,
        config.mode,
        &config.geometry,
        config.render_config()?,
        config.view_controls(),
    )
    .await
}

/// Render an audio file offline, writing a PNG every `snapshot_every` frames.
///
/// Frames run on a fixed-rate clock for the length of the audio. Returns the
/// paths of the written images.
pub async fn render_snapshots<P: AsRef<Path>, Q: AsRef<Path>>(
    audio_path: P,
    out_dir: Q,
    config: &VisualizerConfig,
) -> Result<Vec<PathBuf>, PipelineError> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)?;

    let mut visualizer = open_audio(audio_path, config).await?;
    let duration = visualizer.producer().source().duration();
    let total_frames = (duration.as_secs_f64() * config.fps as f64).ceil() as u64;
    let every = config.snapshot_every.max(1) as u64;

    log::info!(
        "Rendering {} frames ({:.2}s at {} fps), snapshot every {}",
        total_frames,
        duration.as_secs_f64(),
        config.fps,
        every
    );

    let mut written = Vec::new();
    let mut frame_loop = FrameLoop::new(FixedRateClock::new(config.fps).with_limit(total_frames));
    frame_loop.run(|tick| {
        visualizer.tick(tick)?;
        if tick.index % every == 0 {
            let path = out_dir.join(format!("frame_{:05}.png", tick.index));
            visualizer.capture()?.save(&path)?;
            log::debug!("Wrote {}", path.display());
            written.push(path);
        }
        Ok::<_, PipelineError>(FrameControl::Continue)
    })?;

    Ok(written)
}
