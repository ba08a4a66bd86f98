//! HTTP client implementation for the Gemini API.

use std::time::Duration;

use reqwest::{
    Client as ReqwestClient, Response,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use super::{
    error::{Error, Result},
    types::ApiErrorBody,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the Gemini API.
///
/// Performs exactly one attempt per call; callers decide whether to retry.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(base_url: String, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| Error::Config(format!("invalid api key: {}", e)))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("shtepy-gemini-rust/1.0"));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    /// Sends a JSON POST request and decodes the JSON response.
    pub async fn post<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "gemini request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        handle_response(response).await
    }
}

async fn handle_response<R>(response: Response) -> Result<R>
where
    R: DeserializeOwned,
{
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(parse_error(&body, status.as_u16()));
    }

    serde_json::from_slice(&body).map_err(Error::from)
}

fn parse_error(body: &[u8], http_status: u16) -> Error {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            Error::api(http_status, parsed.error.status, parsed.error.message)
        }
        _ => Error::api(
            http_status,
            String::new(),
            String::from_utf8_lossy(body).trim().to_string(),
        ),
    }
}
