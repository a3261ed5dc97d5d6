//! TOML configuration file loading
//!
//! Supports `~/.config/novacare/nova/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on top of
//! defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct NovaConfigFile {
    /// Live session configuration
    #[serde(default)]
    pub live: LiveFileConfig,

    /// Voice profile configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionFileConfig,
}

/// Live streaming endpoint configuration
#[derive(Debug, Default, Deserialize)]
pub struct LiveFileConfig {
    /// WebSocket endpoint URL for the live session
    pub url: Option<String>,

    /// Live model identifier
    pub model: Option<String>,

    /// API key (prefer the `NOVA_API_KEY` env var over storing it here)
    pub api_key: Option<String>,

    /// TTS model used for voice previews
    pub preview_model: Option<String>,
}

/// Voice profile configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Prebuilt voice name (e.g. "Zephyr") or "custom"
    pub profile: Option<String>,

    /// Display name for an imported custom voice
    pub custom_name: Option<String>,

    /// Path to the custom voice sample (WAV or MP3)
    pub custom_sample: Option<String>,
}

/// Session behaviour configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Path to a file holding the system instruction for the companion
    pub instruction_file: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `NovaConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> NovaConfigFile {
    let Some(path) = config_file_path() else {
        return NovaConfigFile::default();
    };

    if !path.exists() {
        return NovaConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                NovaConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            NovaConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/novacare/nova/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("novacare")
            .join("nova")
            .join("config.toml")
    })
}
