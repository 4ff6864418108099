//! Per-frame drivers: samples to geometry, geometry to pixels.

use std::time::Duration;

use crate::audio::SampleSource;
use crate::controls::ViewControls;
use crate::geometry::{GeometryConfig, GeometryError, RibbonGeometry, SamplingMode};
use crate::gpu::{RenderConfig, RibbonRenderer, UniformSet};

use super::frame_loop::FrameTick;
use super::PipelineError;

/// Pulls one sample buffer per frame from a source and rebuilds the mesh.
///
/// The point count is read from the source once, at construction; all
/// scratch buffers are sized then and reused for every frame.
pub struct FrameProducer<S> {
    source: S,
    mode: SamplingMode,
    samples: Vec<u8>,
    geometry: RibbonGeometry,
}

impl<S: SampleSource> FrameProducer<S> {
    pub fn new(source: S, mode: SamplingMode, config: &GeometryConfig) -> Result<Self, GeometryError> {
        let point_count = source.buffer_length();
        let geometry = RibbonGeometry::new(point_count, config)?;
        log::info!(
            "Frame producer: {} points, {} mode",
            point_count,
            mode.name()
        );
        Ok(Self {
            source,
            mode,
            samples: vec![0; point_count],
            geometry,
        })
    }

    /// Advance the source by `elapsed` and rebuild the mesh from its output.
    ///
    /// A source that writes nothing leaves the previous samples in place.
    pub fn produce(&mut self, elapsed: Duration) -> Result<&RibbonGeometry, GeometryError> {
        self.source.advance(elapsed);
        self.source.fill(self.mode, &mut self.samples);
        self.geometry.rebuild(&self.samples, self.mode)?;
        Ok(&self.geometry)
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SamplingMode) {
        self.mode = mode;
    }

    pub fn point_count(&self) -> usize {
        self.geometry.point_count()
    }

    /// Samples used for the most recent frame.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn geometry(&self) -> &RibbonGeometry {
        &self.geometry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

/// A producer, a renderer and the uniform state they share.
pub struct Visualizer<S> {
    producer: FrameProducer<S>,
    renderer: RibbonRenderer,
    uniforms: UniformSet,
    controls: ViewControls,
}

impl<S: SampleSource> Visualizer<S> {
    /// Set up the full session. Fails before any frame is drawn if the GPU,
    /// the program or the uniform schema is unusable.
    pub async fn new(
        source: S,
        mode: SamplingMode,
        geometry: &GeometryConfig,
        render: RenderConfig,
        controls: ViewControls,
    ) -> Result<Self, PipelineError> {
        let producer = FrameProducer::new(source, mode, geometry)?;
        let renderer = RibbonRenderer::new(render, producer.point_count()).await?;
        let mut uniforms = renderer.uniform_set()?;
        controls.publish(&mut uniforms)?;

        Ok(Self {
            producer,
            renderer,
            uniforms,
            controls,
        })
    }

    /// Replace the view state and publish it for the next frame.
    pub fn set_controls(&mut self, controls: ViewControls) -> Result<(), PipelineError> {
        controls.publish(&mut self.uniforms)?;
        self.controls = controls;
        Ok(())
    }

    pub fn controls(&self) -> &ViewControls {
        &self.controls
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn producer(&self) -> &FrameProducer<S> {
        &self.producer
    }

    pub fn producer_mut(&mut self) -> &mut FrameProducer<S> {
        &mut self.producer
    }

    /// Produce and submit one frame.
    pub fn tick(&mut self, tick: &FrameTick) -> Result<(), PipelineError> {
        let geometry = self.producer.produce(tick.elapsed)?;
        self.renderer.render(geometry, &self.uniforms);
        Ok(())
    }

    /// Read back the last rendered frame.
    pub fn capture(&self) -> Result<image::RgbaImage, PipelineError> {
        let config = self.renderer.config();
        let pixels = self.renderer.read_pixels()?;
        image::RgbaImage::from_raw(config.width, config.height, pixels)
            .ok_or(PipelineError::FrameSize)
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.renderer.adapter_info()
    }
}
