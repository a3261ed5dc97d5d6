//! Configuration management for the Nova voice client

pub mod file;

use std::path::PathBuf;

use secrecy::SecretString;

use crate::voices::VoiceProfile;
use crate::{Error, Result};

/// Default live session WebSocket endpoint
pub const DEFAULT_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Default live model identifier
pub const DEFAULT_LIVE_MODEL: &str = "models/gemini-2.5-flash-native-audio-preview-09-2025";

/// Default TTS model used for voice previews
pub const DEFAULT_PREVIEW_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Nova voice client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Live session endpoint configuration
    pub live: LiveConfig,

    /// Selected voice profile
    pub voice: VoiceProfile,

    /// System instruction sent with the session setup
    pub system_instruction: String,
}

/// Live streaming endpoint configuration
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// WebSocket endpoint URL
    pub url: String,

    /// Live model identifier
    pub model: String,

    /// TTS model used for voice previews
    pub preview_model: String,

    /// API key, from `NOVA_API_KEY` or the config file
    api_key: Option<SecretString>,
}

impl LiveConfig {
    /// Get the API key
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no key is configured
    pub fn api_key(&self) -> Result<&SecretString> {
        self.api_key.as_ref().ok_or_else(|| {
            Error::Config(
                "no API key configured; set NOVA_API_KEY or [live].api_key".to_string(),
            )
        })
    }
}

impl Config {
    /// Load configuration from the config file, environment, and overrides
    ///
    /// Precedence: CLI override > environment > config file > default.
    ///
    /// # Errors
    ///
    /// Returns error if the voice profile is invalid or the instruction file
    /// cannot be read
    pub fn load(voice_override: Option<&str>) -> Result<Self> {
        let file = file::load_config_file();

        let url = std::env::var("NOVA_LIVE_URL")
            .ok()
            .or(file.live.url)
            .unwrap_or_else(|| DEFAULT_LIVE_URL.to_string());

        let model = std::env::var("NOVA_LIVE_MODEL")
            .ok()
            .or(file.live.model)
            .unwrap_or_else(|| DEFAULT_LIVE_MODEL.to_string());

        let preview_model = file
            .live
            .preview_model
            .unwrap_or_else(|| DEFAULT_PREVIEW_MODEL.to_string());

        let api_key = std::env::var("NOVA_API_KEY")
            .ok()
            .or(file.live.api_key)
            .map(SecretString::from);

        let voice = resolve_voice(
            voice_override,
            file.voice.profile.as_deref(),
            file.voice.custom_name,
            file.voice.custom_sample.map(PathBuf::from),
        )?;

        let system_instruction = match file.session.instruction_file {
            Some(path) => std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("failed to read instruction file {path}: {e}"))
            })?,
            None => crate::prompt::default_instruction().to_string(),
        };

        Ok(Self {
            live: LiveConfig {
                url,
                model,
                preview_model,
                api_key,
            },
            voice,
            system_instruction,
        })
    }
}

/// Resolve the voice profile from override, file config, and custom sample
fn resolve_voice(
    override_name: Option<&str>,
    file_profile: Option<&str>,
    custom_name: Option<String>,
    custom_sample: Option<PathBuf>,
) -> Result<VoiceProfile> {
    let requested = override_name.or(file_profile);

    match requested {
        Some(name) if name.eq_ignore_ascii_case("custom") => {
            let sample = custom_sample.ok_or_else(|| {
                Error::Config(
                    "custom voice selected but [voice].custom_sample is not set".to_string(),
                )
            })?;
            Ok(VoiceProfile::custom(
                custom_name.unwrap_or_else(|| "Custom Voice".to_string()),
                sample,
            ))
        }
        Some(name) => VoiceProfile::prebuilt(name),
        None => Ok(VoiceProfile::default()),
    }
}
