//! GPU integration tests. Each test returns early when no adapter is available.

use std::time::Duration;

use audioshader::audio::{generate_sweep, write_wav, AnalyserConfig};
use audioshader::pipeline::{FixedRateClock, FrameClock, VisualizerConfig};
use audioshader::{
    render_snapshots, GeometryConfig, GpuContext, PcmSource, RenderConfig, RibbonGeometry,
    RibbonRenderer, SamplingMode, ViewControls, Visualizer,
};

const SIZE: u32 = 96;

async fn create_gpu_context() -> Option<GpuContext> {
    GpuContext::new().await.ok()
}

fn render_config(background: [f32; 3]) -> RenderConfig {
    RenderConfig {
        width: SIZE,
        height: SIZE,
        background,
    }
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * SIZE + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

fn differs_from(pixels: &[u8], background: [u8; 3]) -> usize {
    pixels
        .chunks_exact(4)
        .filter(|p| p[..3] != background)
        .count()
}

#[tokio::test]
async fn test_unbuilt_geometry_draws_background_only() {
    let Some(ctx) = create_gpu_context().await else {
        return;
    };
    let mut renderer = RibbonRenderer::with_context(ctx, render_config([0.0, 0.0, 1.0]), 64).unwrap();

    let geometry = RibbonGeometry::new(64, &GeometryConfig::default()).unwrap();
    let mut uniforms = renderer.uniform_set().unwrap();
    ViewControls::default().publish(&mut uniforms).unwrap();

    renderer.render(&geometry, &uniforms);
    let pixels = renderer.read_pixels().unwrap();

    assert_eq!(pixels.len(), (SIZE * SIZE * 4) as usize);
    assert_eq!(differs_from(&pixels, [0, 0, 255]), 0);
}

#[tokio::test]
async fn test_zigzag_ribbon_is_drawn() {
    let Some(ctx) = create_gpu_context().await else {
        return;
    };
    let mut renderer = RibbonRenderer::with_context(ctx, render_config([0.0; 3]), 8).unwrap();

    let mut geometry = RibbonGeometry::new(8, &GeometryConfig::default()).unwrap();
    geometry
        .rebuild(&[0, 255, 0, 255, 0, 255, 0, 255], SamplingMode::Frequency)
        .unwrap();

    let controls = ViewControls {
        thickness: 0.04,
        aspect: 1.0,
        ..Default::default()
    };
    let mut uniforms = renderer.uniform_set().unwrap();
    controls.publish(&mut uniforms).unwrap();

    renderer.render(&geometry, &uniforms);
    let pixels = renderer.read_pixels().unwrap();

    let lit = differs_from(&pixels, [0, 0, 0]);
    assert!(lit > 0, "ribbon should cover some pixels");
    assert!(lit < (SIZE * SIZE) as usize / 2, "ribbon should not fill the frame");
    assert_eq!(pixel(&pixels, 0, SIZE / 2)[3], 255);
}

#[tokio::test]
async fn test_polar_and_perspective_views() {
    let Some(ctx) = create_gpu_context().await else {
        return;
    };
    let mut renderer = RibbonRenderer::with_context(ctx, render_config([0.0; 3]), 128).unwrap();

    let mut geometry = RibbonGeometry::new(128, &GeometryConfig::default()).unwrap();
    let samples: Vec<u8> = (0..128).map(|i| 100 + (i % 50) as u8).collect();
    geometry.rebuild(&samples, SamplingMode::Frequency).unwrap();

    let mut uniforms = renderer.uniform_set().unwrap();
    for controls in [
        ViewControls {
            polar: true,
            aspect: 1.0,
            thickness: 0.05,
            ..Default::default()
        },
        ViewControls {
            orthographic: false,
            rotation_degrees: [20.0, 10.0, 0.0],
            aspect: 1.0,
            thickness: 0.05,
            ..Default::default()
        },
    ] {
        controls.publish(&mut uniforms).unwrap();
        renderer.render(&geometry, &uniforms);
        let pixels = renderer.read_pixels().unwrap();
        assert!(differs_from(&pixels, [0, 0, 0]) > 0, "{:?}", controls);
    }
}

#[tokio::test]
async fn test_visualizer_ticks_and_captures() {
    if create_gpu_context().await.is_none() {
        return;
    }

    let samples = generate_sweep(100.0, 2000.0, 44100, 1.0, 0.5);
    let source = PcmSource::new(
        samples,
        44100,
        AnalyserConfig {
            fft_size: 512,
            ..Default::default()
        },
    )
    .unwrap();

    let mut visualizer = Visualizer::new(
        source,
        SamplingMode::TimeDomain,
        &GeometryConfig::default(),
        render_config([0.0; 3]),
        ViewControls {
            thickness: 0.05,
            aspect: 1.0,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let mut clock = FixedRateClock::new(30).with_limit(4);
    while let Some(tick) = clock.next_tick() {
        visualizer.tick(&tick).unwrap();
    }
    assert!(visualizer.producer().source().position() > Duration::from_millis(90));

    let image = visualizer.capture().unwrap();
    assert_eq!(image.dimensions(), (SIZE, SIZE));
    assert!(image.pixels().any(|p| p.0[..3] != [0, 0, 0]));
}

#[tokio::test]
async fn test_render_snapshots_writes_pngs() {
    if create_gpu_context().await.is_none() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("sweep.wav");
    write_wav(&wav, &generate_sweep(200.0, 3000.0, 22050, 0.5, 0.6), 22050).unwrap();

    let config = VisualizerConfig {
        width: 64,
        height: 48,
        fps: 30,
        fft_size: 256,
        snapshot_every: 5,
        ..Default::default()
    };
    let out = dir.path().join("frames");
    let written = render_snapshots(&wav, &out, &config).await.unwrap();

    // 0.5s at 30 fps is 15 frames: 0, 5 and 10 are captured.
    assert_eq!(written.len(), 3);
    assert_eq!(written[1], out.join("frame_00005.png"));
    for path in &written {
        let image = image::open(path).unwrap();
        assert_eq!((image.width(), image.height()), (64, 48));
    }
}
