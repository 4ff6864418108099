//! Audioshader Core
//!
//! Audio-reactive waveform rendering: each frame, a fixed-length buffer of
//! byte samples becomes a mitered thick-line ribbon mesh that a wgpu vertex
//! shader expands to constant width.
//!
//! # Features
//!
//! - Audio loading (WAV, MP3, FLAC, AAC) via Symphonia
//! - Byte spectrum and waveform analysis via RustFFT
//! - Allocation-free per-frame mesh generation with capped miter joins
//! - Program reflection via naga, verified before the first frame
//! - Headless GPU rendering via wgpu with PNG snapshots

pub mod audio;
pub mod controls;
pub mod geometry;
pub mod gpu;
pub mod pipeline;

// Re-export commonly used types
pub use audio::{load_audio, AudioData, ByteAnalyser, PcmSource, SampleSource};
pub use controls::ViewControls;
pub use geometry::{GeometryConfig, GeometryError, RibbonGeometry, SamplingMode};
pub use gpu::{GpuContext, RenderConfig, RibbonRenderer, SetupError, UniformSet};
pub use pipeline::{
    render_snapshots, FrameLoop, FrameProducer, PipelineError, Visualizer, VisualizerConfig,
};
