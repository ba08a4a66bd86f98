//! Text-to-speech synthesis.

use async_trait::async_trait;
use shtepy_audio::pcm::{self, DecodeError, Format, SampleBuffer};

/// Error type for synthesis operations.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("other error: {0}")]
    Other(String),
}

/// Base64 text carrying signed 16-bit little-endian mono PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio(String);

impl EncodedAudio {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the payload into samples of the given format.
    pub fn decode(&self, format: Format) -> Result<SampleBuffer, DecodeError> {
        pcm::decode_base64(&self.0, format)
    }
}

impl From<String> for EncodedAudio {
    fn from(payload: String) -> Self {
        Self(payload)
    }
}

impl From<&str> for EncodedAudio {
    fn from(payload: &str) -> Self {
        Self(payload.to_string())
    }
}

/// Interface for a speech generation service.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesizes `text` with the named voice.
    ///
    /// Returns `Ok(None)` when the service answered without audio.
    async fn synthesize(&self, text: &str, voice: &str)
    -> Result<Option<EncodedAudio>, SynthesisError>;
}
