//! Narration requests and playback lifecycle states.

use serde::{Deserialize, Serialize};
use shtepy_audio::pcm::{DecodeError, Format};
use std::fmt;

/// Default sample rate of synthesized speech, in Hz.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 24000;

fn default_sample_rate_hz() -> u32 {
    DEFAULT_SAMPLE_RATE_HZ
}

/// A single narration to synthesize and play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackRequest {
    /// Prompt sent to the speech generation service.
    pub text: String,
    /// Prebuilt voice name, e.g. "Zephyr".
    #[serde(alias = "voice")]
    pub voice_id: String,
    /// Sample rate of the returned PCM payload.
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u32,
}

impl PlaybackRequest {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate_hz: u32) -> Self {
        self.sample_rate_hz = sample_rate_hz;
        self
    }

    /// Returns the mono PCM format the payload is decoded into.
    pub fn format(&self) -> Format {
        Format::mono(self.sample_rate_hz)
    }
}

/// Why a narration ended in the error state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("narration text is empty")]
    EmptyText,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("output error: {0}")]
    Output(String),
}

/// Lifecycle state of a playback pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Requesting,
    Decoding,
    Playing,
    Error(PlaybackError),
    Cancelled,
}

impl PlaybackState {
    /// Returns true while a request or playback is in flight.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PlaybackState::Requesting | PlaybackState::Decoding | PlaybackState::Playing
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Requesting => "requesting",
            PlaybackState::Decoding => "decoding",
            PlaybackState::Playing => "playing",
            PlaybackState::Error(_) => "error",
            PlaybackState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Error(err) => write!(f, "error: {}", err),
            other => f.write_str(other.name()),
        }
    }
}
