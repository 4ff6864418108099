//! GPU context initialization and setup errors.

use std::sync::Arc;
use wgpu::{Adapter, Device, Instance, Queue};

use super::program::AttributeKind;
use super::uniforms::UniformKind;
use crate::geometry::GeometryError;

/// Fatal errors raised while bringing up a rendering session.
///
/// None of these are retried; a session that fails setup never renders.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("Shader failed to compile:\n{0}")]
    ShaderCompile(String),
    #[error("Shader has no entry point `{0}`")]
    MissingEntryPoint(String),
    #[error("Vertex attribute `{0}` not found in program")]
    MissingAttribute(String),
    #[error("Vertex attribute `{name}` should be {expected}, found {found}")]
    AttributeTypeMismatch {
        name: String,
        expected: AttributeKind,
        found: String,
    },
    #[error("Program has no uniform block at group {group}, binding {binding}")]
    MissingUniformBlock { group: u32, binding: u32 },
    #[error("Uniform `{0}` not found in program")]
    MissingUniform(String),
    #[error("Uniform `{name}` should be {expected}, found {found}")]
    UniformTypeMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
    #[error("Uniform `{name}` has unsupported type {ty}")]
    UnsupportedUniformType { name: String, ty: String },
    #[error("Output surface must be non-zero and at most {max}x{max}, got {width}x{height}")]
    InvalidSurface { width: u32, height: u32, max: u32 },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// GPU context holding device and queue for rendering.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Arc<Adapter>,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuContext {
    /// Create a new GPU context for headless rendering.
    pub async fn new() -> Result<Self, SetupError> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::METAL | wgpu::Backends::VULKAN | wgpu::Backends::GL,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|_| SetupError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("audioshader"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let info = adapter.get_info();
        log::info!("Using GPU adapter {} ({:?})", info.name, info.backend);

        Ok(Self {
            instance,
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Get info about the GPU adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }
}
