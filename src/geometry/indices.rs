//! Triangle indices over the duplicated rails.
//!
//! Point `j` owns vertices `2j` (minus rail) and `2j + 1` (plus rail). The quad
//! between point `j` and `j + 1` is split into `(i, i+1, i+2)` and
//! `(i+2, i+1, i+3)` with `i = 2j`, giving counter-clockwise winding.
//!
//! One quad is emitted per point, so the buffer always holds `6N` indices. The
//! last point has no successor; its quad is clamped onto vertex `2N - 1` and
//! collapses to degenerate triangles that are never drawn.

/// Indices emitted per point.
pub const INDICES_PER_POINT: usize = 6;

/// Largest point count whose duplicated vertices fit 16-bit indices.
pub const MAX_POINTS: usize = (u16::MAX as usize + 1) / 2;

/// Number of indices to draw for `point_count` points.
pub fn draw_count(point_count: usize) -> u32 {
    (point_count.saturating_sub(1) * INDICES_PER_POINT) as u32
}

/// Builds the index buffer for a point count.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexGenerator;

impl IndexGenerator {
    /// Build indices into `out`, reusing its allocation.
    ///
    /// # Panics
    ///
    /// Panics if `point_count > MAX_POINTS`.
    pub fn build_into(point_count: usize, out: &mut Vec<u16>) {
        assert!(
            point_count <= MAX_POINTS,
            "{} points exceed the 16-bit index range (max {})",
            point_count,
            MAX_POINTS
        );

        out.clear();
        out.reserve(point_count * INDICES_PER_POINT);
        if point_count == 0 {
            return;
        }

        let last = (point_count * 2 - 1) as u32;
        for j in 0..point_count {
            let i = (j * 2) as u32;
            let quad = [i, i + 1, i + 2, i + 2, i + 1, i + 3];
            out.extend(quad.iter().map(|&idx| idx.min(last) as u16));
        }
    }

    /// Build a freshly allocated index buffer.
    pub fn build(point_count: usize) -> Vec<u16> {
        let mut out = Vec::with_capacity(point_count * INDICES_PER_POINT);
        Self::build_into(point_count, &mut out);
        out
    }
}
