//! PCM audio format definitions.

use std::time::Duration;

/// Describes a 16-bit signed integer PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Format {
    /// Sample rate in Hz (e.g., 24000, 48000).
    pub sample_rate: u32,
    /// True for stereo (2 channels), false for mono (1 channel).
    pub stereo: bool,
}

impl Format {
    /// Creates a new format with the given sample rate and mono audio.
    pub const fn mono(sample_rate: u32) -> Self {
        Self { sample_rate, stereo: false }
    }

    /// Creates a new format with the given sample rate and stereo audio.
    pub const fn stereo(sample_rate: u32) -> Self {
        Self { sample_rate, stereo: true }
    }

    /// Returns the number of channels (1 for mono, 2 for stereo).
    pub fn channels(&self) -> u32 {
        if self.stereo { 2 } else { 1 }
    }

    /// Returns the number of bytes per sample frame.
    /// For 16-bit audio: 2 bytes for mono, 4 bytes for stereo.
    pub fn sample_bytes(&self) -> usize {
        if self.stereo { 4 } else { 2 }
    }

    /// Returns the number of bytes produced per second.
    pub fn bytes_rate(&self) -> u64 {
        self.sample_rate as u64 * self.sample_bytes() as u64
    }

    /// Returns the number of bytes needed to hold `duration` of audio.
    pub fn bytes_in_duration(&self, duration: Duration) -> u64 {
        let frames = duration.as_nanos() * self.sample_rate as u128 / 1_000_000_000;
        frames as u64 * self.sample_bytes() as u64
    }

    /// Returns the playback duration of `frames` sample frames.
    pub fn frames_duration(&self, frames: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = frames as u128 * 1_000_000_000 / self.sample_rate as u128;
        Duration::from_nanos(nanos as u64)
    }

    /// Returns the playback duration of `bytes` bytes of audio.
    pub fn duration(&self, bytes: u64) -> Duration {
        self.frames_duration((bytes / self.sample_bytes() as u64) as usize)
    }
}

// Common format presets
impl Format {
    /// 16kHz mono
    pub const MONO_16K: Format = Format::mono(16000);
    /// 24kHz mono (speech synthesis output)
    pub const MONO_24K: Format = Format::mono(24000);
    /// 44.1kHz mono
    pub const MONO_44K: Format = Format::mono(44100);
    /// 48kHz mono
    pub const MONO_48K: Format = Format::mono(48000);
    /// 48kHz stereo
    pub const STEREO_48K: Format = Format::stereo(48000);
}

impl Default for Format {
    fn default() -> Self {
        Self::MONO_24K
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_channels() {
        assert_eq!(Format::mono(24000).channels(), 1);
        assert_eq!(Format::stereo(48000).channels(), 2);
        assert_eq!(Format::mono(24000).sample_bytes(), 2);
        assert_eq!(Format::stereo(48000).sample_bytes(), 4);
    }

    #[test]
    fn test_format_default_is_speech_rate() {
        let fmt = Format::default();
        assert_eq!(fmt.sample_rate, 24000);
        assert!(!fmt.stereo);
    }

    #[test]
    fn test_bytes_in_duration() {
        let fmt = Format::MONO_24K;
        // 1 second at 24kHz mono 16-bit = 48000 bytes
        assert_eq!(fmt.bytes_rate(), 48000);
        assert_eq!(fmt.bytes_in_duration(Duration::from_secs(1)), 48000);
        assert_eq!(fmt.bytes_in_duration(Duration::from_millis(20)), 960);
    }

    #[test]
    fn test_duration() {
        let fmt = Format::MONO_24K;
        assert_eq!(fmt.duration(48000), Duration::from_secs(1));
        assert_eq!(fmt.frames_duration(2400), Duration::from_millis(100));
        assert_eq!(Format::mono(0).frames_duration(100), Duration::ZERO);
    }
}
