//! Google Gemini speech generation client.
//!
//! This crate provides a client for the Gemini `generateContent` API with
//! audio output, and [`GeminiSynthesizer`], which plugs the client into the
//! narration pipeline as its speech generation collaborator.
//!
//! # Example
//!
//! ```rust,no_run
//! use shtepy_gemini::{Client, SpeechRequest, VOICE_ZEPHYR};
//!
//! # async fn run() -> shtepy_gemini::Result<()> {
//! let client = Client::new("AIza...")?;
//! let resp = client
//!     .speech()
//!     .synthesize(&SpeechRequest::new("Welcome home.", VOICE_ZEPHYR))
//!     .await?;
//! println!("audio: {} base64 chars", resp.audio.map(|a| a.len()).unwrap_or(0));
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod http;
mod speech;
mod synthesizer;
mod types;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_TTS_MODEL};
pub use error::{Error, Result};
pub use speech::{SpeechRequest, SpeechResponse, SpeechService};
pub use synthesizer::GeminiSynthesizer;
pub use types::*;
