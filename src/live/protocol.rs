//! Wire format for the live endpoint
//!
//! JSON messages in the vendor's camelCase schema. Outbound: one `setup`
//! message, then `realtimeInput` audio frames. Inbound: `setupComplete`
//! acknowledging the handshake, then `serverContent` carrying audio,
//! transcription, and turn/interruption flags in any combination.

use serde::{Deserialize, Serialize};

use crate::CAPTURE_SAMPLE_RATE;
use crate::audio::codec;
use crate::live::{ServerEvent, SessionSetup};

/// Mime type for raw PCM at the given sample rate
#[must_use]
pub fn pcm_mime(sample_rate: u32) -> String {
    format!("audio/pcm;rate={sample_rate}")
}

/// Message sent to the endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    /// Session handshake
    Setup(Setup),
    /// Streamed capture audio
    RealtimeInput(RealtimeInput),
}

impl ClientMessage {
    /// Build the handshake message for a session
    #[must_use]
    pub fn setup(setup: &SessionSetup) -> Self {
        Self::Setup(Setup {
            model: setup.model.clone(),
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: setup.voice.clone(),
                        },
                    },
                },
            },
            system_instruction: Content {
                parts: vec![Part {
                    text: Some(setup.system_instruction.clone()),
                    inline_data: None,
                }],
            },
            input_audio_transcription: TranscriptionConfig {},
            output_audio_transcription: TranscriptionConfig {},
        })
    }

    /// Wrap one encoded PCM capture frame
    #[must_use]
    pub fn audio_frame(pcm: &[u8]) -> Self {
        Self::RealtimeInput(RealtimeInput {
            media_chunks: vec![Blob {
                mime_type: pcm_mime(CAPTURE_SAMPLE_RATE),
                data: codec::to_base64(pcm),
            }],
        })
    }
}

/// Session handshake payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub system_instruction: Content,
    pub input_audio_transcription: TranscriptionConfig,
    pub output_audio_transcription: TranscriptionConfig,
}

/// Response generation settings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

/// Spoken output settings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

/// Voice selection wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

/// Prebuilt voice selection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

/// Enables transcription for one direction
#[derive(Debug, Serialize)]
pub struct TranscriptionConfig {}

/// Streamed capture audio payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<Blob>,
}

/// A base64 payload with its mime type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// Text content split into parts
#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One content part: text or inline binary data
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

/// Message received from the endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default)]
    pub setup_complete: Option<SetupComplete>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
}

/// Handshake acknowledgement
#[derive(Debug, Deserialize)]
pub struct SetupComplete {}

/// Model output: audio, transcription, and turn signals
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub interrupted: bool,
    #[serde(default)]
    pub output_transcription: Option<Transcription>,
}

/// A transcript fragment
#[derive(Debug, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
}

impl ServerMessage {
    /// Flatten one wire message into session events
    ///
    /// A single message may carry several signals at once; they are emitted
    /// in processing order: transcription, turn completion, audio payloads,
    /// interruption.
    #[must_use]
    pub fn into_events(self) -> Vec<ServerEvent> {
        let Some(content) = self.server_content else {
            return Vec::new();
        };

        let mut events = Vec::new();

        if let Some(transcription) = content.output_transcription {
            if !transcription.text.is_empty() {
                events.push(ServerEvent::Transcript(transcription.text));
            }
        }

        if content.turn_complete {
            events.push(ServerEvent::TurnComplete);
        }

        if let Some(turn) = content.model_turn {
            for part in turn.parts {
                if let Some(blob) = part.inline_data {
                    events.push(ServerEvent::Audio(blob.data));
                }
            }
        }

        if content.interrupted {
            events.push(ServerEvent::Interrupted);
        }

        events
    }
}
