//! Audio utilities for Shtepy narration.
//!
//! This crate provides:
//!
//! - `pcm`: PCM format description, decoded sample buffers, and the decoder
//!   for base64-encoded signed 16-bit little-endian (L16) payloads returned
//!   by speech synthesis services.
//!
//! # Example
//!
//! ```rust
//! use shtepy_audio::pcm::{self, Format};
//!
//! // 16 zero bytes, i.e. eight silent samples
//! let buffer = pcm::decode_base64("AAAAAAAAAAAAAAAAAAAAAA==", Format::MONO_24K).unwrap();
//! assert_eq!(buffer.len(), 8);
//! assert_eq!(buffer.format().sample_rate, 24000);
//! ```

pub mod pcm;

pub use pcm::Format;
