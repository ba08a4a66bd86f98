//! Gemini-backed [`Synthesizer`] for the narration pipeline.

use async_trait::async_trait;
use shtepy_speech::{EncodedAudio, SynthesisError, Synthesizer};
use tracing::debug;

use super::{
    client::Client,
    error::Error,
    speech::SpeechRequest,
};

/// Speech generation through Gemini's prebuilt TTS voices.
pub struct GeminiSynthesizer {
    client: Client,
    model: Option<String>,
}

impl GeminiSynthesizer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            model: None,
        }
    }

    /// Overrides the client's default model for every request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Synthesizer for GeminiSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<Option<EncodedAudio>, SynthesisError> {
        let mut request = SpeechRequest::new(text, voice);
        request.model = self.model.clone();

        let resp = self
            .client
            .speech()
            .synthesize(&request)
            .await
            .map_err(into_synthesis_error)?;

        if resp.audio.is_none() {
            debug!(finish_reason = ?resp.finish_reason, "gemini returned no audio");
        }
        Ok(resp.audio.map(EncodedAudio::from))
    }
}

fn into_synthesis_error(err: Error) -> SynthesisError {
    if err.is_unauthorized() {
        return SynthesisError::Service(format!("api key rejected: {}", err));
    }
    if err.is_rate_limit() {
        return SynthesisError::Service(format!("rate limited: {}", err));
    }
    match err {
        Error::Http(e) => SynthesisError::Transport(e.to_string()),
        other => SynthesisError::Service(other.to_string()),
    }
}
