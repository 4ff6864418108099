//! Integration tests for ribbon mesh generation.

use audioshader::geometry::{
    draw_count, IndexGenerator, MiterGenerator, PathBuilder, PathMapping, RibbonGeometry,
    SamplingMode, VertexExpander, DEFAULT_MITER_LIMIT,
};
use audioshader::GeometryConfig;

fn turn_path(degrees: f32) -> Vec<[f32; 2]> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    vec![[-1.0, 0.0], [0.0, 0.0], [cos, sin]]
}

#[test]
fn test_indices_stay_in_bounds() {
    for n in 2..200 {
        let indices = IndexGenerator::build(n);
        assert_eq!(indices.len(), 6 * n);
        assert!(indices.iter().all(|&i| (i as usize) < 2 * n), "n = {}", n);

        // Drawn quads join consecutive point pairs only.
        for quad in indices[..draw_count(n) as usize].chunks(6) {
            let base = quad[0];
            assert_eq!(quad, [base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        }
    }
}

#[test]
fn test_straight_run_has_unit_miter() {
    let miter = MiterGenerator::new(DEFAULT_MITER_LIMIT);
    for path in [
        [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
        [[0.0, 0.0], [1.0, 1.0], [3.0, 3.0]],
        [[0.5, -0.2], [0.5, 0.1], [0.5, 0.9]],
    ] {
        let (_, miters) = miter.compute(&path);
        assert!((miters[1] - 1.0).abs() < 1e-6, "path {:?}", path);
    }
}

#[test]
fn test_expanded_lengths() {
    let builder = PathBuilder::new(PathMapping::default());
    let miter = MiterGenerator::new(DEFAULT_MITER_LIMIT);

    for n in [1, 2, 5, 64, 1024] {
        let samples: Vec<u8> = (0..n).map(|i| (i * 37 % 256) as u8).collect();
        let path = builder.build(&samples, SamplingMode::Frequency);
        let (normals, miters) = miter.compute(&path);
        let buffer = VertexExpander::expand(&path, &normals, &miters);

        assert_eq!(buffer.positions().len(), 4 * n);
        assert_eq!(buffer.normals().len(), 4 * n);
        assert_eq!(buffer.miters().len(), 2 * n);
    }
}

#[test]
fn test_miter_grows_with_turn_and_is_capped() {
    let miter = MiterGenerator::new(DEFAULT_MITER_LIMIT);
    let mut previous = 1.0;

    for step in 0..=36 {
        let turn = step as f32 * 5.0;
        let (_, miters) = miter.compute(&turn_path(turn.min(179.9)));
        let m = miters[1];
        assert!(m >= previous - 1e-5, "miter shrank at {} degrees", turn);
        assert!(m <= DEFAULT_MITER_LIMIT);
        previous = m;
    }

    let (_, miters) = miter.compute(&turn_path(179.9));
    assert_eq!(miters[1], DEFAULT_MITER_LIMIT);
}

#[test]
fn test_flat_samples_give_straight_ribbon() {
    for mode in [SamplingMode::Frequency, SamplingMode::TimeDomain] {
        let mut geometry = RibbonGeometry::new(32, &GeometryConfig::default()).unwrap();
        geometry.rebuild(&[77; 32], mode).unwrap();

        assert!(geometry.normals().iter().all(|n| n[0] == 0.0 && n[1] == 1.0));
        assert!(geometry.miters().iter().all(|&m| m == 1.0));

        let y = geometry.path()[0][1];
        assert!(geometry.path().iter().all(|p| p[1] == y));
    }
}

#[test]
fn test_zigzag_scenario() {
    let mut geometry = RibbonGeometry::new(4, &GeometryConfig::default()).unwrap();
    geometry
        .rebuild(&[0, 255, 0, 255], SamplingMode::Frequency)
        .unwrap();

    let ys: Vec<f32> = geometry.path().iter().map(|p| p[1]).collect();
    assert!(ys[0] < 0.0 && ys[1] > 0.0 && ys[2] < 0.0 && ys[3] > 0.0);

    let miters = geometry.miters();
    assert!(miters[1] > 1.0 && miters[2] > 1.0);
    assert_eq!(miters[0], 1.0);
    assert_eq!(miters[3], 1.0);

    assert_eq!(
        &geometry.indices()[..18],
        &[0, 1, 2, 2, 1, 3, 2, 3, 4, 4, 3, 5, 4, 5, 6, 6, 5, 7]
    );
    assert_eq!(geometry.indices().len(), 24);
    assert_eq!(geometry.draw_count(), 18);
}

#[test]
fn test_rebuild_is_idempotent() {
    let samples: Vec<u8> = (0..256).map(|i| ((i * 7) ^ (i >> 2)) as u8).collect();

    let mut a = RibbonGeometry::new(256, &GeometryConfig::default()).unwrap();
    let mut b = RibbonGeometry::new(256, &GeometryConfig::default()).unwrap();

    // Unrelated frame first, so any state leaking across frames would show.
    a.rebuild(&[255; 256], SamplingMode::TimeDomain).unwrap();
    a.rebuild(&samples, SamplingMode::Frequency).unwrap();
    b.rebuild(&samples, SamplingMode::Frequency).unwrap();

    let bits = |g: &RibbonGeometry| -> Vec<u32> {
        g.vertices().as_slice().iter().map(|f| f.to_bits()).collect()
    };
    assert_eq!(bits(&a), bits(&b));
    assert_eq!(a.indices(), b.indices());
}

#[test]
fn test_input_samples_are_not_mutated() {
    let samples = vec![10u8, 200, 30, 140];
    let copy = samples.clone();
    let mut geometry = RibbonGeometry::new(4, &GeometryConfig::default()).unwrap();
    geometry.rebuild(&samples, SamplingMode::TimeDomain).unwrap();
    assert_eq!(samples, copy);
}

#[test]
fn test_custom_miter_limit_from_config() {
    let config: GeometryConfig = serde_json::from_str(r#"{"miter_limit": 1.5}"#).unwrap();
    let mut geometry = RibbonGeometry::new(4, &config).unwrap();
    geometry
        .rebuild(&[0, 255, 0, 255], SamplingMode::Frequency)
        .unwrap();
    assert!(geometry.miters().iter().all(|&m| m <= 1.5));
}
