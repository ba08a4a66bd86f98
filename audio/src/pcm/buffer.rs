//! Decoded sample buffers.

use super::Format;
use std::io::{self, Write};
use std::time::Duration;

/// A buffer of normalized floating-point samples.
///
/// Samples lie in `[-1.0, 1.0)`. The buffer is the unit handed to an audio
/// output for playback and is dropped once playback ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    format: Format,
    samples: Vec<f32>,
}

impl SampleBuffer {
    /// Creates a new buffer with the given format and samples.
    pub fn new(format: Format, samples: Vec<f32>) -> Self {
        Self { format, samples }
    }

    /// Returns the audio format of this buffer.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> u32 {
        self.format.channels()
    }

    /// Returns the samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consumes the buffer and returns the samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the playback duration.
    pub fn duration(&self) -> Duration {
        self.format
            .frames_duration(self.samples.len() / self.format.channels() as usize)
    }

    /// Returns the largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Re-quantizes the samples to signed 16-bit little-endian bytes.
    pub fn to_l16_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            let value = (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
            data.extend_from_slice(&value.to_le_bytes());
        }
        data
    }

    /// Writes the samples to `w` as signed 16-bit little-endian PCM.
    pub fn write_l16_to(&self, w: &mut dyn Write) -> io::Result<u64> {
        let data = self.to_l16_bytes();
        w.write_all(&data)?;
        Ok(data.len() as u64)
    }
}
