//! Decoding of signed 16-bit little-endian (L16) PCM payloads.
//!
//! Speech synthesis services return raw L16 audio as base64 text. Decoding
//! normalizes each sample by dividing by 32768, so `i16::MIN` maps to exactly
//! `-1.0` and `i16::MAX` to `32767 / 32768`. The range is intentionally
//! asymmetric; samples are neither clamped nor rescaled.

use super::{Format, SampleBuffer};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Standard alphabet; trailing `=` padding may be present or omitted.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const NORMALIZER: f32 = 32768.0;

/// Error type for payload decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid base64.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    /// The decoded byte length does not hold a whole number of samples.
    #[error("misaligned length: {0} bytes is not a whole number of 16-bit samples")]
    MisalignedLength(usize),
}

impl From<base64::DecodeError> for DecodeError {
    fn from(err: base64::DecodeError) -> Self {
        DecodeError::InvalidEncoding(err.to_string())
    }
}

/// Decodes a base64 L16 payload into a sample buffer of the given format.
pub fn decode_base64(payload: &str, format: Format) -> Result<SampleBuffer, DecodeError> {
    let data = PAYLOAD_ENGINE.decode(payload)?;
    decode(&data, format)
}

/// Decodes raw L16 bytes into a sample buffer of the given format.
///
/// Odd-length input is rejected rather than truncated.
pub fn decode(data: &[u8], format: Format) -> Result<SampleBuffer, DecodeError> {
    if data.len() % format.sample_bytes() != 0 {
        return Err(DecodeError::MisalignedLength(data.len()));
    }

    let samples = data
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / NORMALIZER)
        .collect();

    Ok(SampleBuffer::new(format, samples))
}

/// Encodes raw bytes with the payload alphabet.
pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}
