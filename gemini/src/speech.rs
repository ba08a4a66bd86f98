//! Speech synthesis service.

use std::sync::Arc;

use tracing::debug;

use super::{
    error::Result,
    http::HttpClient,
    types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Modality, Part, SpeechConfig},
};

/// A text-to-speech request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    /// Prompt to speak. Style directions may be embedded in the text.
    pub text: String,
    /// Prebuilt voice name.
    pub voice: String,
    /// Model override; the client's default model is used when `None`.
    pub model: Option<String>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `generateContent` body requesting audio output.
    pub fn to_generate_request(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part {
                    text: Some(self.text.clone()),
                    inline_data: None,
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec![Modality::Audio],
                speech_config: Some(SpeechConfig::prebuilt(&self.voice)),
            },
        }
    }
}

/// Result of a speech synthesis call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechResponse {
    /// Base64 PCM payload, if the model returned audio.
    pub audio: Option<String>,
    /// MIME type of the payload, e.g. `audio/L16;codec=pcm;rate=24000`.
    pub mime_type: Option<String>,
    pub finish_reason: Option<String>,
    pub model_version: Option<String>,
}

impl From<GenerateContentResponse> for SpeechResponse {
    fn from(resp: GenerateContentResponse) -> Self {
        let inline = resp.first_inline_data().cloned();
        Self {
            audio: inline
                .as_ref()
                .map(|d| d.data.clone())
                .filter(|d| !d.is_empty()),
            mime_type: inline.map(|d| d.mime_type).filter(|m| !m.is_empty()),
            finish_reason: resp.finish_reason().map(str::to_string),
            model_version: resp.model_version,
        }
    }
}

/// Speech synthesis service.
pub struct SpeechService {
    http: Arc<HttpClient>,
    model: String,
}

impl SpeechService {
    pub(crate) fn new(http: Arc<HttpClient>, model: String) -> Self {
        Self { http, model }
    }

    /// Synthesizes speech in a single request.
    pub async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let path = format!("/v1beta/models/{}:generateContent", model);
        debug!(model = %model, voice = %request.voice, chars = request.text.len(), "synthesize");

        let resp: GenerateContentResponse = self
            .http
            .post(&path, &request.to_generate_request())
            .await?;

        Ok(resp.into())
    }
}
