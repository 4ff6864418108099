//! Thick-line mesh generation.
//!
//! Turns one frame of byte samples into a mitered ribbon mesh:
//! - [`PathBuilder`]: samples to points in normalized device coordinates
//! - [`MiterGenerator`]: per-point joint normals and miter scales
//! - [`VertexExpander`]: rail duplication into a flat `[positions][normals][miters]` buffer
//! - [`IndexGenerator`]: two counter-clockwise triangles per quad
//!
//! [`RibbonGeometry`] owns every buffer involved and is sized once per session,
//! so rebuilding a frame never allocates.

mod expand;
mod indices;
mod miter;
mod path;

pub use expand::{VertexBuffer, VertexExpander, VertexLayout};
pub use indices::{draw_count, IndexGenerator, INDICES_PER_POINT, MAX_POINTS};
pub use miter::{MiterGenerator, DEFAULT_MITER_LIMIT};
pub use path::{PathBuilder, PathMapping, SamplingMode};

use serde::{Deserialize, Serialize};

/// A point or direction in normalized device space.
pub type Point = [f32; 2];

/// Errors raised when a geometry session is set up or fed inconsistent data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("{count} points exceed the 16-bit index limit of {max}")]
    TooManyPoints { count: usize, max: usize },
    #[error("Expected {expected} samples per frame, got {got}")]
    SampleCountMismatch { expected: usize, got: usize },
}

/// Tunable geometry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub mapping: PathMapping,
    /// Upper bound on the miter scale at sharp joints.
    pub miter_limit: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            mapping: PathMapping::default(),
            miter_limit: DEFAULT_MITER_LIMIT,
        }
    }
}

/// Frame-reused scratch for the sample → mesh pipeline.
#[derive(Debug, Clone)]
pub struct RibbonGeometry {
    builder: PathBuilder,
    miter: MiterGenerator,
    point_count: usize,
    path: Vec<Point>,
    normals: Vec<Point>,
    miters: Vec<f32>,
    vertices: VertexBuffer,
    indices: Vec<u16>,
}

impl RibbonGeometry {
    /// Allocate buffers for a session of `point_count` samples per frame.
    pub fn new(point_count: usize, config: &GeometryConfig) -> Result<Self, GeometryError> {
        if point_count > MAX_POINTS {
            return Err(GeometryError::TooManyPoints {
                count: point_count,
                max: MAX_POINTS,
            });
        }

        // N is fixed for the session, so the indices never change.
        let indices = IndexGenerator::build(point_count);

        Ok(Self {
            builder: PathBuilder::new(config.mapping),
            miter: MiterGenerator::new(config.miter_limit),
            point_count,
            path: Vec::with_capacity(point_count),
            normals: Vec::with_capacity(point_count),
            miters: Vec::with_capacity(point_count),
            vertices: VertexBuffer::with_capacity(point_count),
            indices,
        })
    }

    /// Regenerate the mesh from one frame of samples, in place.
    pub fn rebuild(&mut self, samples: &[u8], mode: SamplingMode) -> Result<(), GeometryError> {
        if samples.len() != self.point_count {
            return Err(GeometryError::SampleCountMismatch {
                expected: self.point_count,
                got: samples.len(),
            });
        }

        self.builder.build_into(samples, mode, &mut self.path);
        self.miter
            .compute_into(&self.path, &mut self.normals, &mut self.miters);
        VertexExpander::expand_into(&self.path, &self.normals, &self.miters, &mut self.vertices);
        Ok(())
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn layout(&self) -> VertexLayout {
        VertexLayout::new(self.point_count)
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    pub fn normals(&self) -> &[Point] {
        &self.normals
    }

    pub fn miters(&self) -> &[f32] {
        &self.miters
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Element count for the indexed draw call, `(N - 1) * 6`.
    pub fn draw_count(&self) -> u32 {
        draw_count(self.point_count)
    }

    /// True once [`rebuild`](Self::rebuild) has produced a mesh.
    pub fn is_ready(&self) -> bool {
        self.point_count > 0 && self.path.len() == self.point_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_fills_all_buffers() {
        let mut geometry = RibbonGeometry::new(8, &GeometryConfig::default()).unwrap();
        assert!(!geometry.is_ready());

        geometry.rebuild(&[100; 8], SamplingMode::Frequency).unwrap();

        assert!(geometry.is_ready());
        assert_eq!(geometry.path().len(), 8);
        assert_eq!(geometry.vertices().as_slice().len(), 80);
        assert_eq!(geometry.indices().len(), 48);
        assert_eq!(geometry.draw_count(), 42);
    }

    #[test]
    fn test_rebuild_does_not_reallocate() {
        let mut geometry = RibbonGeometry::new(64, &GeometryConfig::default()).unwrap();
        geometry.rebuild(&[0; 64], SamplingMode::Frequency).unwrap();
        let capacity = geometry.vertices().capacity();
        let ptr = geometry.vertices().as_slice().as_ptr();

        let samples: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
        geometry.rebuild(&samples, SamplingMode::TimeDomain).unwrap();

        assert_eq!(geometry.vertices().capacity(), capacity);
        assert_eq!(geometry.vertices().as_slice().as_ptr(), ptr);
    }

    #[test]
    fn test_sample_count_mismatch_is_rejected() {
        let mut geometry = RibbonGeometry::new(4, &GeometryConfig::default()).unwrap();
        assert_eq!(
            geometry.rebuild(&[0; 5], SamplingMode::Frequency),
            Err(GeometryError::SampleCountMismatch { expected: 4, got: 5 })
        );
    }

    #[test]
    fn test_too_many_points_is_rejected() {
        let err = RibbonGeometry::new(MAX_POINTS + 1, &GeometryConfig::default()).unwrap_err();
        assert!(matches!(err, GeometryError::TooManyPoints { .. }));
    }

    #[test]
    fn test_config_json_defaults() {
        let config: GeometryConfig = serde_json::from_str(r#"{"miter_limit": 2.5}"#).unwrap();
        assert_eq!(config.miter_limit, 2.5);
        assert_eq!(config.mapping, PathMapping::default());
    }
}
