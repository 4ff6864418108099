//! Rail duplication and the flat vertex buffer layout.
//!
//! Each path point is emitted twice so the vertex shader can push one copy to
//! either side of the line. The combined buffer is three contiguous sections:
//!
//! ```text
//! [ positions: 2N x vec2 ][ normals: 2N x vec2 ][ miters: 2N x f32 ]
//! ```
//!
//! Miters are emitted as `[-m, m]` pairs; the sign selects the rail.

use super::Point;

/// Byte layout of the combined vertex buffer for a given point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    point_count: usize,
}

impl VertexLayout {
    pub const POSITION_COMPONENTS: usize = 2;
    pub const NORMAL_COMPONENTS: usize = 2;
    pub const MITER_COMPONENTS: usize = 1;

    pub fn new(point_count: usize) -> Self {
        Self { point_count }
    }

    /// Number of original path points.
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Number of vertices after rail duplication.
    pub fn duplicated_count(&self) -> usize {
        self.point_count * 2
    }

    pub fn position_floats(&self) -> usize {
        self.duplicated_count() * Self::POSITION_COMPONENTS
    }

    pub fn normal_floats(&self) -> usize {
        self.duplicated_count() * Self::NORMAL_COMPONENTS
    }

    pub fn miter_floats(&self) -> usize {
        self.duplicated_count() * Self::MITER_COMPONENTS
    }

    pub fn total_floats(&self) -> usize {
        self.position_floats() + self.normal_floats() + self.miter_floats()
    }

    pub fn positions_offset(&self) -> u64 {
        0
    }

    /// `8 * N_dup` bytes.
    pub fn normals_offset(&self) -> u64 {
        (self.position_floats() * std::mem::size_of::<f32>()) as u64
    }

    /// `16 * N_dup` bytes.
    pub fn miters_offset(&self) -> u64 {
        self.normals_offset() + (self.normal_floats() * std::mem::size_of::<f32>()) as u64
    }

    pub fn byte_len(&self) -> u64 {
        (self.total_floats() * std::mem::size_of::<f32>()) as u64
    }
}

/// Flat `[positions][normals][miters]` float buffer for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexBuffer {
    data: Vec<f32>,
    layout: Option<VertexLayout>,
}

impl VertexBuffer {
    /// Preallocate room for `point_count` points.
    pub fn with_capacity(point_count: usize) -> Self {
        Self {
            data: Vec::with_capacity(VertexLayout::new(point_count).total_floats()),
            layout: None,
        }
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout.unwrap_or(VertexLayout::new(0))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn positions(&self) -> &[f32] {
        let layout = self.layout();
        &self.data[..layout.position_floats()]
    }

    pub fn normals(&self) -> &[f32] {
        let layout = self.layout();
        let start = layout.position_floats();
        &self.data[start..start + layout.normal_floats()]
    }

    pub fn miters(&self) -> &[f32] {
        let layout = self.layout();
        &self.data[layout.position_floats() + layout.normal_floats()..]
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }
}

/// Duplicates path, normal and miter data into a [`VertexBuffer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexExpander;

impl VertexExpander {
    /// Expand into `out`, reusing its allocation.
    ///
    /// # Panics
    ///
    /// Panics if the three input sequences differ in length.
    pub fn expand_into(path: &[Point], normals: &[Point], miters: &[f32], out: &mut VertexBuffer) {
        assert!(
            path.len() == normals.len() && path.len() == miters.len(),
            "path/normal/miter length mismatch: {} / {} / {}",
            path.len(),
            normals.len(),
            miters.len()
        );

        let layout = VertexLayout::new(path.len());
        let data = &mut out.data;
        data.clear();
        data.reserve(layout.total_floats());

        for p in path {
            data.extend_from_slice(&[p[0], p[1], p[0], p[1]]);
        }
        for n in normals {
            data.extend_from_slice(&[n[0], n[1], n[0], n[1]]);
        }
        for &m in miters {
            data.extend_from_slice(&[-m, m]);
        }

        out.layout = Some(layout);
    }

    /// Expand into a freshly allocated buffer.
    pub fn expand(path: &[Point], normals: &[Point], miters: &[f32]) -> VertexBuffer {
        let mut out = VertexBuffer::with_capacity(path.len());
        Self::expand_into(path, normals, miters, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_in_order() {
        let path = [[1.0, 2.0], [3.0, 4.0]];
        let normals = [[0.0, 1.0], [1.0, 0.0]];
        let miters = [1.5, 2.0];

        let buffer = VertexExpander::expand(&path, &normals, &miters);

        assert_eq!(buffer.positions(), &[1.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 4.0]);
        assert_eq!(buffer.normals(), &[0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(buffer.miters(), &[-1.5, 1.5, -2.0, 2.0]);
    }

    #[test]
    fn test_sections_are_contiguous() {
        let buffer = VertexExpander::expand(&[[0.0, 0.0]; 3], &[[0.0, 1.0]; 3], &[1.0; 3]);
        assert_eq!(buffer.as_slice().len(), 3 * 10);
        assert_eq!(buffer.as_slice()[..12], *buffer.positions());
        assert_eq!(buffer.as_slice()[24..], *buffer.miters());
    }

    #[test]
    fn test_layout_offsets() {
        let layout = VertexLayout::new(4);
        assert_eq!(layout.duplicated_count(), 8);
        assert_eq!(layout.positions_offset(), 0);
        assert_eq!(layout.normals_offset(), 8 * 8);
        assert_eq!(layout.miters_offset(), 16 * 8);
        assert_eq!(layout.byte_len(), 20 * 8);
    }

    #[test]
    fn test_empty_expansion() {
        let buffer = VertexExpander::expand(&[], &[], &[]);
        assert!(buffer.as_slice().is_empty());
        assert!(buffer.positions().is_empty());
        assert!(buffer.miters().is_empty());
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn test_mismatched_lengths_panic() {
        VertexExpander::expand(&[[0.0, 0.0]], &[], &[1.0]);
    }
}
