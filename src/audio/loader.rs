//! Audio file loading using Symphonia.
//!
//! Supports WAV, MP3, FLAC, and AAC formats.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use thiserror::Error;

/// Errors that can occur during audio loading.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode audio: {0}")]
    Decode(#[from] SymphoniaError),

    #[error("No audio track found in file")]
    NoAudioTrack,

    #[error("Unknown sample rate")]
    UnknownSampleRate,

    #[error("Audio file contains no samples")]
    Empty,
}

/// Audio data loaded from a file.
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Interleaved audio samples (f32, normalized to -1.0..1.0)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    pub channels: usize,
}

impl AudioData {
    /// Duration of the audio in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    /// Downmix to mono by averaging channels.
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }
}

/// The first decodable track of a probed container.
struct ProbedTrack {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    id: u32,
    sample_rate: u32,
}

fn probe(path: &Path) -> Result<ProbedTrack, AudioError> {
    let stream = MediaSourceStream::new(Box::new(File::open(path)?), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let format = symphonia::default::get_probe()
        .format(&hint, stream, &FormatOptions::default(), &MetadataOptions::default())?
        .format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;

    let id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(AudioError::UnknownSampleRate)?;
    let decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    Ok(ProbedTrack {
        format,
        decoder,
        id,
        sample_rate,
    })
}

/// Load audio from a file path.
///
/// The audio is decoded to interleaved f32 samples in `-1.0..1.0`. The
/// channel count is taken from the decoded stream.
///
/// ```no_run
/// use audioshader::audio::load_audio;
///
/// let audio = load_audio("song.mp3").unwrap();
/// println!("{:.2}s at {}Hz", audio.duration(), audio.sample_rate);
/// ```
pub fn load_audio<P: AsRef<Path>>(path: P) -> Result<AudioData, AudioError> {
    let path = path.as_ref();
    let mut track = probe(path)?;

    let (samples, channels) = decode_track(&mut track)?;
    if samples.is_empty() {
        return Err(AudioError::Empty);
    }

    let audio = AudioData {
        samples,
        sample_rate: track.sample_rate,
        channels,
    };
    log::info!(
        "Loaded {}: {:.2}s, {}Hz, {} channel(s)",
        path.display(),
        audio.duration(),
        audio.sample_rate,
        audio.channels
    );
    Ok(audio)
}

/// Decode every packet of the track, returning interleaved samples and the
/// channel count.
fn decode_track(track: &mut ProbedTrack) -> Result<(Vec<f32>, usize), AudioError> {
    let mut samples = Vec::new();
    let mut scratch: Option<SampleBuffer<f32>> = None;
    let mut channels = 0;
    let mut skipped = 0usize;

    loop {
        let packet = match track.format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => {
                track.decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match track.decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                log::debug!("Dropping packet: {}", reason);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();
        let needed = decoded.capacity() as u64;
        let buf = match scratch.take() {
            Some(buf) if buf.capacity() as u64 >= needed => scratch.insert(buf),
            _ => scratch.insert(SampleBuffer::new(needed, spec)),
        };
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if skipped > 0 {
        log::warn!("Skipped {} undecodable packet(s)", skipped);
    }
    Ok((samples, channels.max(1)))
}
