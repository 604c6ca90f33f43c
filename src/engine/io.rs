//! WAV file I/O for the offline host
//!
//! Audio is read into 32-bit float at its native sample rate; the filter
//! chain is prepared for whatever rate the file carries, so nothing is
//! resampled.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{EqError, Result};

/// Output bit depth for exported files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    Int16,
    Int24,
    #[default]
    Float32,
}

impl BitDepth {
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            16 => Ok(BitDepth::Int16),
            24 => Ok(BitDepth::Int24),
            32 => Ok(BitDepth::Float32),
            other => Err(EqError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", other),
            }),
        }
    }

    fn spec(self, channels: u16, sample_rate: u32) -> WavSpec {
        let (bits_per_sample, sample_format) = match self {
            BitDepth::Int16 => (16, SampleFormat::Int),
            BitDepth::Int24 => (24, SampleFormat::Int),
            BitDepth::Float32 => (32, SampleFormat::Float),
        };
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

fn wav_error(context: &str, e: hound::Error) -> EqError {
    match e {
        hound::Error::IoError(io) => EqError::Io(io),
        other => EqError::InvalidAudio {
            reason: format!("{}: {}", context, other),
            source: Some(other),
        },
    }
}

/// Read a mono or stereo WAV file
pub fn import_wav(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(EqError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| wav_error("Failed to open WAV file", e))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    if spec.sample_rate == 0 {
        return Err(EqError::UnsupportedFormat {
            format: "WAV header with a sample rate of 0 Hz".to_string(),
        });
    }

    if ChannelLayout::from_count(channels).is_none() {
        return Err(EqError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    AudioBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)
}

/// Write a buffer to a WAV file at its own sample rate
pub fn export_wav(buffer: &AudioBuffer, path: &Path, depth: BitDepth) -> Result<()> {
    let spec = depth.spec(buffer.channels() as u16, buffer.sample_rate);
    let mut writer = WavWriter::create(path, spec).map_err(|e| wav_error("Failed to create WAV file", e))?;

    for sample in buffer.to_interleaved() {
        let written = match depth {
            BitDepth::Int16 => writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16),
            // 24-bit stored as i32 in hound
            BitDepth::Int24 => writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32),
            BitDepth::Float32 => writer.write_sample(sample),
        };
        written.map_err(|e| wav_error("Failed to write sample", e))?;
    }

    writer.finalize().map_err(|e| wav_error("Failed to finalize WAV file", e))
}

/// Generate a sine tone with the same signal on every channel
pub fn generate_test_tone(frequency: f32, duration_secs: f32, layout: ChannelLayout, sample_rate: u32) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let mut buffer = AudioBuffer::new(num_samples, layout, sample_rate);
    let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;

    for channel in &mut buffer.samples {
        for (i, sample) in channel.iter_mut().enumerate() {
            *sample = (angular_freq * i as f64).sin() as f32;
        }
    }

    buffer
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let scale = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => {
            return reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| wav_error("Failed to read float samples", e));
        }
        (SampleFormat::Int, 8) => 128.0,
        (SampleFormat::Int, 16) => 32768.0,
        (SampleFormat::Int, 24) => 8388608.0,
        (SampleFormat::Int, 32) => 2147483648.0,
        (SampleFormat::Int, bits) => {
            return Err(EqError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits),
            })
        }
    };

    reader
        .samples::<i32>()
        .map(|s| s.map(|v| (v as f64 / scale) as f32))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| wav_error("Failed to read integer samples", e))
}
