//! Gemini API client.

use std::sync::Arc;
use std::time::Duration;

use super::{
    error::{Error, Result},
    http::HttpClient,
    speech::SpeechService,
};

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default text-to-speech model.
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini API client.
///
/// # Example
///
/// ```rust,no_run
/// use shtepy_gemini::Client;
///
/// let client = Client::builder("AIza...")
///     .base_url("https://generativelanguage.googleapis.com")
///     .build()?;
/// # Ok::<(), shtepy_gemini::Error>(())
/// ```
pub struct Client {
    http: Arc<HttpClient>,
    base_url: String,
    model: String,
}

impl Client {
    /// Creates a client with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(api_key).build()
    }

    /// Creates a new client builder for more configuration options.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default speech model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the speech synthesis service.
    pub fn speech(&self) -> SpeechService {
        SpeechService::new(self.http.clone(), self.model.clone())
    }
}

/// Builder for creating a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl ClientBuilder {
    /// Creates a new builder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_TTS_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the API base URL. Empty values keep the default.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.is_empty() {
            self.base_url = url;
        }
        self
    }

    /// Sets the default speech model. Empty values keep the default.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.is_empty() {
            self.model = model;
        }
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("api key is required".to_string()));
        }

        let http = HttpClient::new(self.base_url.clone(), &self.api_key, self.timeout)?;

        Ok(Client {
            http: Arc::new(http),
            base_url: self.base_url,
            model: self.model,
        })
    }
}
