//! Audio Buffer Management
//!
//! Planar audio buffer used by the offline host and the tests. The filter
//! chain itself only sees `&mut [&mut [f32]]`; this type owns the storage
//! and hands out per-block views.

use crate::error::{EqError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Bus channel configuration accepted by the equalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    Mono,
    #[default]
    Stereo,
}

impl ChannelLayout {
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved 32-bit float audio
///
/// # Example
/// ```
/// use vocal_eq::engine::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(48000, ChannelLayout::Stereo, 48000);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Create a buffer from interleaved sample data
    pub fn from_interleaved(interleaved: &[f32], num_channels: usize, sample_rate: u32) -> Result<Self> {
        if num_channels == 0 {
            return Err(EqError::InvalidAudio {
                reason: "channel count must be at least 1".to_string(),
                source: None,
            });
        }

        if interleaved.len() % num_channels != 0 {
            return Err(EqError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channels() * self.len());
        for i in 0..self.len() {
            for channel in &self.samples {
                interleaved.push(channel[i]);
            }
        }
        interleaved
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Mutable views of every channel over `start..end`
    ///
    /// Allocates the outer Vec; meant for offline block loops.
    pub fn block_mut(&mut self, start: usize, end: usize) -> Vec<&mut [f32]> {
        self.samples.iter_mut().map(|ch| &mut ch[start..end]).collect()
    }

    /// Run `f` over consecutive blocks of at most `block_size` frames
    pub fn for_each_block<F>(&mut self, block_size: usize, mut f: F)
    where
        F: FnMut(&mut [&mut [f32]]),
    {
        let total = self.len();
        let block_size = block_size.max(1);
        let mut start = 0;
        while start < total {
            let end = (start + block_size).min(total);
            let mut views = self.block_mut(start, end);
            f(views.as_mut_slice());
            start = end;
        }
    }

    /// RMS level of one channel in dB
    pub fn rms_db(&self, channel: usize) -> f32 {
        let samples = match self.samples.get(channel) {
            Some(s) if !s.is_empty() => s,
            _ => return f32::NEG_INFINITY,
        };
        let sum_sq: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
        linear_to_db((sum_sq / samples.len() as f64).sqrt() as f32)
    }

    /// Peak level across all channels in dB
    pub fn peak_db(&self) -> f32 {
        let peak = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max);
        linear_to_db(peak)
    }

    /// True when no sample is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.samples.iter().flatten().all(|s| s.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_buffer_is_silent() {
        let buffer = AudioBuffer::new(100, ChannelLayout::Mono, 44100);
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.rms_db(0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_interleave_round_trip() {
        let data = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = AudioBuffer::from_interleaved(&data, 2, 48000).unwrap();
        assert_eq!(buffer.channel(0), &[0.1, 0.2, 0.3]);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2, -0.3]);
        assert_eq!(buffer.to_interleaved(), data.to_vec());
        assert_eq!(buffer.channel_layout(), Some(ChannelLayout::Stereo));
    }

    #[test]
    fn test_from_interleaved_rejects_ragged_data() {
        assert!(AudioBuffer::from_interleaved(&[0.0; 5], 2, 48000).is_err());
        assert!(AudioBuffer::from_interleaved(&[0.0; 4], 0, 48000).is_err());
    }

    #[test]
    fn test_for_each_block_covers_everything() {
        let mut buffer = AudioBuffer::new(1000, ChannelLayout::Stereo, 48000);
        let mut sizes = Vec::new();
        buffer.for_each_block(300, |block| {
            sizes.push(block[0].len());
            for ch in block.iter_mut() {
                ch.fill(1.0);
            }
        });
        assert_eq!(sizes, vec![300, 300, 300, 100]);
        assert!(buffer.samples.iter().flatten().all(|&s| s == 1.0));
    }

    #[test]
    fn test_levels() {
        let mut buffer = AudioBuffer::new(4, ChannelLayout::Mono, 48000);
        buffer.channel_mut(0).copy_from_slice(&[0.5, -0.5, 0.5, -0.5]);
        assert_relative_eq!(buffer.rms_db(0), -6.0206, epsilon = 1e-3);
        assert_relative_eq!(buffer.peak_db(), -6.0206, epsilon = 1e-3);
        assert!(buffer.is_finite());
        assert_relative_eq!(buffer.duration_secs(), 4.0 / 48000.0);
    }
}
