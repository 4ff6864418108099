//! GPU rendering using wgpu.
//!
//! Provides headless ribbon rendering: program reflection and verification,
//! per-frame buffer and uniform upload, and offscreen readback.

pub mod buffers;
pub mod context;
pub mod layouts;
pub mod program;
pub mod renderer;
pub mod textures;
pub mod uniforms;

pub use buffers::RibbonBuffers;
pub use context::{GpuContext, SetupError};
pub use program::{AttributeKind, AttributeSlot, ProgramInfo, RibbonProgram, RIBBON_ATTRIBUTES, RIBBON_SHADER};
pub use renderer::{RenderConfig, RibbonRenderer};
pub use textures::CaptureError;
pub use uniforms::{
    Uniform, UniformBlock, UniformBridge, UniformError, UniformKind, UniformSet, UniformSlot,
    UniformValue, RIBBON_UNIFORMS,
};
