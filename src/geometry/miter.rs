//! Per-point normals and miter lengths for a polyline.
//!
//! Every point gets a unit normal pointing to the left of the direction of
//! travel and a miter scale. Offsetting the point by
//! `normal * miter * thickness / 2` lands on the outer corner of the joint, so
//! a constant-width ribbon keeps its width through bends.
//!
//! Interior points use the bisected joint normal with
//! `miter = 1 / cos(turn / 2)`; endpoints use their single segment's normal with
//! a miter of 1. The miter is capped at a configurable limit since it diverges
//! as the path folds back on itself.

use super::Point;

/// Default cap on the miter scale.
pub const DEFAULT_MITER_LIMIT: f32 = 4.0;

/// Normal used when a path has no usable direction at all.
const FALLBACK_NORMAL: Point = [0.0, 1.0];
const EPSILON: f32 = 1e-6;

#[inline]
fn perp(v: Point) -> Point {
    [-v[1], v[0]]
}

#[inline]
fn dot(a: Point, b: Point) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}

/// Unit direction from `a` to `b`, or `None` for a zero-length segment.
#[inline]
fn direction(a: Point, b: Point) -> Option<Point> {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len = dx.hypot(dy);
    (len > EPSILON).then(|| [dx / len, dy / len])
}

/// Computes normals and miter scales for open polylines.
#[derive(Debug, Clone, Copy)]
pub struct MiterGenerator {
    limit: f32,
}

impl Default for MiterGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MITER_LIMIT)
    }
}

impl MiterGenerator {
    /// Create a generator with the given miter cap (never below 1).
    pub fn new(limit: f32) -> Self {
        Self {
            limit: if limit.is_finite() { limit.max(1.0) } else { DEFAULT_MITER_LIMIT },
        }
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    /// Normal and miter for a joint between two unit directions.
    pub fn join(&self, incoming: Point, outgoing: Point) -> (Point, f32) {
        let sum = [incoming[0] + outgoing[0], incoming[1] + outgoing[1]];
        let len = sum[0].hypot(sum[1]);
        if len < EPSILON {
            // Full reversal: the bisector is undefined.
            return (perp(incoming), self.limit);
        }

        let tangent = [sum[0] / len, sum[1] / len];
        let normal = perp(tangent);
        // cos of half the turn angle
        let cos_half = dot(tangent, incoming);
        let miter = if cos_half > EPSILON {
            (1.0 / cos_half).clamp(1.0, self.limit)
        } else {
            self.limit
        };
        (normal, miter)
    }

    /// Compute normals and miters into reusable buffers.
    ///
    /// Zero-length segments borrow the nearest valid direction (previous
    /// segment first, otherwise the next one), so coincident points produce a
    /// consistent normal instead of NaNs.
    pub fn compute_into(&self, path: &[Point], normals: &mut Vec<Point>, miters: &mut Vec<f32>) {
        normals.clear();
        miters.clear();

        let n = path.len();
        match n {
            0 => return,
            1 => {
                normals.push(FALLBACK_NORMAL);
                miters.push(1.0);
                return;
            }
            _ => {}
        }

        let seed = path
            .windows(2)
            .find_map(|w| direction(w[0], w[1]))
            .unwrap_or([1.0, 0.0]);

        let mut incoming = seed;
        for i in 0..n {
            let outgoing = if i + 1 < n {
                direction(path[i], path[i + 1]).unwrap_or(incoming)
            } else {
                incoming
            };

            if i == 0 {
                normals.push(perp(outgoing));
                miters.push(1.0);
            } else if i == n - 1 {
                normals.push(perp(incoming));
                miters.push(1.0);
            } else {
                let (normal, miter) = self.join(incoming, outgoing);
                normals.push(normal);
                miters.push(miter);
            }

            incoming = outgoing;
        }
    }

    /// Compute freshly allocated normals and miters.
    pub fn compute(&self, path: &[Point]) -> (Vec<Point>, Vec<f32>) {
        let mut normals = Vec::with_capacity(path.len());
        let mut miters = Vec::with_capacity(path.len());
        self.compute_into(path, &mut normals, &mut miters);
        (normals, miters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_straight_run_has_unit_miter() {
        let path = [[-1.0, 0.0], [0.0, 0.0], [1.0, 0.0]];
        let (normals, miters) = MiterGenerator::default().compute(&path);
        assert!(miters.iter().all(|&m| approx(m, 1.0)));
        assert!(normals.iter().all(|n| approx(n[0], 0.0) && approx(n[1], 1.0)));
    }

    #[test]
    fn test_right_angle_miter_is_sqrt2() {
        let path = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        let (normals, miters) = MiterGenerator::default().compute(&path);
        assert!(approx(miters[1], std::f32::consts::SQRT_2));
        let h = std::f32::consts::FRAC_1_SQRT_2;
        assert!(approx(normals[1][0], -h) && approx(normals[1][1], h));
    }

    #[test]
    fn test_offset_lands_on_outer_corner() {
        // Offset edges at half-width 1 meet at (1, 1) on the outside of this right turn.
        let path = [[-1.0, 0.0], [0.0, 0.0], [0.0, -1.0]];
        let (normals, miters) = MiterGenerator::new(10.0).compute(&path);
        let corner = [normals[1][0] * miters[1], normals[1][1] * miters[1]];
        assert!(approx(corner[0], 1.0), "{:?}", corner);
        assert!(approx(corner[1], 1.0), "{:?}", corner);
    }

    #[test]
    fn test_endpoints_use_segment_normal() {
        let path = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let (normals, miters) = MiterGenerator::default().compute(&path);
        assert_eq!(normals[0], [-1.0, 0.0]);
        assert_eq!(normals[2], [-0.0, 1.0]);
        assert_eq!(miters[0], 1.0);
        assert_eq!(miters[2], 1.0);
    }

    #[test]
    fn test_reversal_is_capped() {
        let path = [[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]];
        let generator = MiterGenerator::new(3.0);
        let (normals, miters) = generator.compute(&path);
        assert_eq!(miters[1], 3.0);
        assert!(normals[1].iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_zero_length_segments_stay_finite() {
        let path = [[0.0, 0.0], [0.0, 0.0], [1.0, 0.0], [1.0, 0.0]];
        let (normals, miters) = MiterGenerator::default().compute(&path);
        for (n, m) in normals.iter().zip(&miters) {
            assert!(n[0].is_finite() && n[1].is_finite() && m.is_finite());
            assert!(approx(n[1], 1.0));
        }
    }

    #[test]
    fn test_all_coincident_points_use_fallback() {
        let path = [[0.5, 0.5]; 3];
        let (normals, miters) = MiterGenerator::default().compute(&path);
        assert!(normals.iter().all(|n| approx(n[0], 0.0) && approx(n[1], 1.0)));
        assert!(miters.iter().all(|&m| m == 1.0));
    }

    #[test]
    fn test_single_and_empty_paths() {
        let generator = MiterGenerator::default();
        assert_eq!(generator.compute(&[]), (vec![], vec![]));
        assert_eq!(generator.compute(&[[0.3, 0.3]]), (vec![[0.0, 1.0]], vec![1.0]));
    }

    #[test]
    fn test_limit_never_below_one() {
        assert_eq!(MiterGenerator::new(0.2).limit(), 1.0);
        assert_eq!(MiterGenerator::new(f32::NAN).limit(), DEFAULT_MITER_LIMIT);
    }
}
