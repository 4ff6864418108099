//! Headless ribbon renderer.

use serde::{Deserialize, Serialize};

use super::buffers::RibbonBuffers;
use super::context::{GpuContext, SetupError};
use super::program::{ProgramInfo, RibbonProgram};
use super::textures::{CaptureError, OffscreenFrame};
use super::uniforms::{UniformBridge, UniformSet, RIBBON_UNIFORMS};
use crate::geometry::{GeometryError, RibbonGeometry, MAX_POINTS};

/// Output surface settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub background: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            background: [0.0, 0.0, 0.0],
        }
    }
}

impl RenderConfig {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

fn check_point_count(point_count: usize) -> Result<(), GeometryError> {
    if point_count > MAX_POINTS {
        return Err(GeometryError::TooManyPoints {
            count: point_count,
            max: MAX_POINTS,
        });
    }
    Ok(())
}

/// Reject output sizes the device cannot allocate a target for.
fn check_surface(config: &RenderConfig) -> Result<(), SetupError> {
    let max = wgpu::Limits::default().max_texture_dimension_2d;
    if config.width == 0 || config.height == 0 || config.width > max || config.height > max {
        return Err(SetupError::InvalidSurface {
            width: config.width,
            height: config.height,
            max,
        });
    }
    Ok(())
}

/// Draws a [`RibbonGeometry`] into an offscreen RGBA8 texture.
pub struct RibbonRenderer {
    ctx: GpuContext,
    program: RibbonProgram,
    buffers: RibbonBuffers,
    bridge: UniformBridge,
    frame: OffscreenFrame,
    config: RenderConfig,
}

impl RibbonRenderer {
    /// Bring up a GPU context and a renderer for `point_count` points.
    pub async fn new(config: RenderConfig, point_count: usize) -> Result<Self, SetupError> {
        check_surface(&config)?;
        check_point_count(point_count)?;
        let ctx = GpuContext::new().await?;
        Self::with_context(ctx, config, point_count)
    }

    /// Create a renderer on an existing context.
    pub fn with_context(
        ctx: GpuContext,
        config: RenderConfig,
        point_count: usize,
    ) -> Result<Self, SetupError> {
        check_surface(&config)?;
        check_point_count(point_count)?;

        let format = wgpu::TextureFormat::Rgba8Unorm;
        let program = RibbonProgram::new(&ctx.device, format)?;
        let buffers = RibbonBuffers::new(&ctx.device, point_count);
        let bridge = UniformBridge::new(
            &ctx.device,
            &program.bind_group_layout,
            program.info.uniform_block_size(),
        );
        let frame = OffscreenFrame::new(&ctx.device, config.width, config.height, format);

        log::info!(
            "Ribbon renderer ready: {}x{}, {} points",
            config.width,
            config.height,
            point_count
        );

        Ok(Self {
            ctx,
            program,
            buffers,
            bridge,
            frame,
            config,
        })
    }

    /// A uniform set verified against this renderer's program.
    pub fn uniform_set(&self) -> Result<UniformSet, SetupError> {
        UniformSet::from_program(&self.program.info, RIBBON_UNIFORMS)
    }

    pub fn program(&self) -> &ProgramInfo {
        &self.program.info
    }

    /// Upload the frame and submit its draw without waiting for the GPU.
    pub fn render(&mut self, geometry: &RibbonGeometry, uniforms: &UniformSet) {
        self.buffers
            .upload(&self.ctx.device, &self.ctx.queue, geometry);
        self.bridge.upload(&self.ctx.queue, uniforms);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ribbon_encoder"),
            });
        self.encode(&mut encoder);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        let [r, g, b] = self.config.background;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ribbon_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.frame.view(),
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let count = self.buffers.draw_count();
        if count == 0 {
            return;
        }

        pass.set_pipeline(&self.program.pipeline);
        pass.set_bind_group(0, self.bridge.bind_group(), &[]);
        self.buffers.bind(&mut pass);
        pass.draw_indexed(0..count, 0, 0..1);
    }

    /// Copy the last rendered frame to the CPU as tightly packed RGBA.
    ///
    /// Blocks until the GPU has finished all submitted work.
    pub fn read_pixels(&self) -> Result<Vec<u8>, CaptureError> {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });
        self.frame.encode_copy(&mut encoder);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        self.frame.read_pixels(&self.ctx.device)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.ctx.adapter_info()
    }
}
