//! PCM codec for the live session wire format
//!
//! The live endpoint exchanges raw 16-bit little-endian PCM, carried as
//! base64 text. Capture frames are f32 samples in [-1.0, 1.0]; inbound audio
//! arrives as base64 PCM at the playback rate.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

/// A playable audio chunk reconstructed from an inbound payload
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Interleaved f32 samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
}

impl AudioChunk {
    /// Duration of the chunk in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        if self.channels == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        let frames = self.samples.len() / self.channels as usize;
        frames as f64 / f64::from(self.sample_rate)
    }
}

/// Encode f32 samples as 16-bit little-endian PCM bytes
///
/// Out-of-range samples are clamped. Empty input yields empty output.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_frame(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (f64::from(sample) * 32768.0).clamp(-32768.0, 32767.0) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode 16-bit little-endian PCM bytes back to f32 samples
///
/// # Errors
///
/// Returns `Error::Decode` if the byte length is odd
pub fn decode_frame(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 2 != 0 {
        return Err(Error::Decode(format!(
            "PCM payload length {} is not a multiple of 2",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
        .collect())
}

/// Encode bytes as standard base64 for wire transport
#[must_use]
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 from the wire
///
/// # Errors
///
/// Returns `Error::Decode` on invalid characters or length
pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| Error::Decode(format!("invalid base64 payload: {e}")))
}

/// Reconstruct a playable chunk from raw PCM bytes
///
/// # Errors
///
/// Returns `Error::Decode` if the payload is malformed or the format is
/// inconsistent (zero channels, sample count not divisible by channels)
pub fn decode_audio_chunk(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioChunk> {
    if channels == 0 {
        return Err(Error::Decode("channel count must be nonzero".to_string()));
    }

    let samples = decode_frame(bytes)?;
    if samples.len() % channels as usize != 0 {
        return Err(Error::Decode(format!(
            "{} samples do not divide into {channels} channels",
            samples.len()
        )));
    }

    Ok(AudioChunk {
        samples,
        sample_rate,
        channels,
    })
}

/// Reconstruct a playable chunk from a base64 PCM payload
///
/// # Errors
///
/// Returns `Error::Decode` on malformed base64 or PCM data
pub fn decode_base64_chunk(text: &str, sample_rate: u32, channels: u16) -> Result<AudioChunk> {
    decode_audio_chunk(&from_base64(text)?, sample_rate, channels)
}
