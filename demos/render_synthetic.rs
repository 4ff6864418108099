//! Example: Render ribbon snapshots from synthetic audio.
//!
//! Generates a rising sine sweep, writes it to a WAV file and renders PNG
//! snapshots of the waveform ribbon in both sampling modes.
//!
//! Run with:
//!     cargo run --example render_synthetic [output_dir]

use std::path::PathBuf;

use anyhow::Context;
use audioshader::audio::{generate_sweep, write_wav};
use audioshader::{render_snapshots, SamplingMode, VisualizerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let out_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("audioshader_demo"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    println!("Audioshader - Synthetic Sweep Example");
    println!("=====================================\n");

    let sample_rate = 44100;
    let duration = 3.0;
    println!("Generating 80 Hz -> 8 kHz sweep ({}s)...", duration);
    let samples = generate_sweep(80.0, 8000.0, sample_rate, duration, 0.7);
    let wav_path = out_dir.join("sweep.wav");
    write_wav(&wav_path, &samples, sample_rate).context("writing sweep WAV")?;

    for mode in [SamplingMode::Frequency, SamplingMode::TimeDomain] {
        let config = VisualizerConfig {
            width: 640,
            height: 360,
            fps: 30,
            mode,
            background: "#0b0b12".to_string(),
            thickness: 0.03,
            snapshot_every: 15,
            ..Default::default()
        };

        let frames_dir = out_dir.join(mode.name());
        println!("\nRendering {} mode into {}", mode.name(), frames_dir.display());
        let written = render_snapshots(&wav_path, &frames_dir, &config)
            .await
            .with_context(|| format!("rendering {} snapshots", mode.name()))?;

        for path in &written {
            println!("  {}", path.display());
        }
    }

    println!("\nDone!");
    Ok(())
}
