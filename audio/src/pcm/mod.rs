//! PCM (Pulse Code Modulation) audio handling.
//!
//! # Key Types
//!
//! - [`Format`]: Sample rate and channel layout of 16-bit PCM audio
//! - [`SampleBuffer`]: Normalized floating-point samples ready for playback
//! - [`DecodeError`]: Why an encoded payload could not become a buffer
//!
//! The decoding functions in [`l16`] are pure: identical input always yields
//! identical samples.

mod buffer;
mod format;
pub mod l16;

pub use buffer::SampleBuffer;
pub use format::Format;
pub use l16::{DecodeError, decode, decode_base64};
