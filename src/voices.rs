//! Voice profile selection
//!
//! The live endpoint exposes a fixed set of prebuilt voices. Users can also
//! import a local audio sample as a named custom profile; custom profiles are
//! honored by the preview path only (see [`VoiceProfile::live_voice_name`]).

use std::path::PathBuf;

use crate::{Error, Result};

/// Prebuilt voices accepted by the live endpoint
pub const PREBUILT_VOICES: &[&str] = &["Zephyr", "Puck", "Charon", "Kore", "Fenrir"];

/// Voice used for the live session when a custom profile is selected
///
/// The live-streaming path only accepts prebuilt voice identifiers, so a
/// custom profile falls back to this fixed voice for the session while the
/// preview path plays the imported sample itself.
pub const CUSTOM_LIVE_FALLBACK_VOICE: &str = "Kore";

/// A selected voice profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceProfile {
    /// One of the endpoint's prebuilt voices
    Prebuilt(String),
    /// A user-imported voice sample
    Custom {
        /// Display name chosen by the user
        name: String,
        /// Path to the sample file (WAV or MP3)
        sample_path: PathBuf,
    },
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self::Prebuilt(PREBUILT_VOICES[0].to_string())
    }
}

impl VoiceProfile {
    /// Create a prebuilt profile, validating against the known voice list
    ///
    /// Matching is case-insensitive; the canonical casing is stored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Voice` if the name is not a known prebuilt voice
    pub fn prebuilt(name: &str) -> Result<Self> {
        PREBUILT_VOICES
            .iter()
            .find(|v| v.eq_ignore_ascii_case(name))
            .map(|v| Self::Prebuilt((*v).to_string()))
            .ok_or_else(|| {
                Error::Voice(format!(
                    "unknown voice '{name}' (available: {})",
                    PREBUILT_VOICES.join(", ")
                ))
            })
    }

    /// Create a custom profile from an imported sample
    #[must_use]
    pub fn custom(name: String, sample_path: PathBuf) -> Self {
        Self::Custom { name, sample_path }
    }

    /// Display name of the profile
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Prebuilt(name) | Self::Custom { name, .. } => name,
        }
    }

    /// Voice identifier to use for the live session
    ///
    /// Custom profiles map to [`CUSTOM_LIVE_FALLBACK_VOICE`]; the live path
    /// cannot stream through an imported sample.
    #[must_use]
    pub fn live_voice_name(&self) -> &str {
        match self {
            Self::Prebuilt(name) => name,
            Self::Custom { .. } => CUSTOM_LIVE_FALLBACK_VOICE,
        }
    }

    /// Whether this is a custom imported profile
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}
