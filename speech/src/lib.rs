//! Speech synthesis interfaces and narration playback.
//!
//! This crate provides:
//! - [`Synthesizer`]: Turns text and a voice name into an encoded audio payload
//! - [`AudioOutput`] and [`PlaybackHandle`]: Platform audio playback
//! - [`SpeechPlaybackPipeline`]: Requests, decodes, and plays one narration
//!   at a time, exposing cancellable, observable [`PlaybackState`]
//!
//! # Example
//!
//! ```rust,ignore
//! use shtepy_speech::{PlaybackRequest, SpeechPlaybackPipeline};
//!
//! let pipeline = SpeechPlaybackPipeline::new(synthesizer, output);
//! pipeline.start(PlaybackRequest::new("Tell the story of the old house", "Zephyr"))?;
//!
//! let state = pipeline.wait().await;
//! ```

mod output;
mod pipeline;
mod state;
mod synthesizer;

pub use output::*;
pub use pipeline::*;
pub use state::*;
pub use synthesizer::*;

#[cfg(test)]
mod tests;
