//! Voice previews
//!
//! Prebuilt voices synthesize a short sample sentence through the vendor TTS
//! endpoint; custom voices play the imported sample file directly. Previews
//! play one at a time: starting a new one cuts off the previous.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::audio::codec::{self, AudioChunk};
use crate::audio::playback::{AudioSink, SourceId};
use crate::config::LiveConfig;
use crate::voices::VoiceProfile;
use crate::{Error, PLAYBACK_SAMPLE_RATE, Result};

/// Sentence spoken by prebuilt voice previews
const SAMPLE_TEXT: &str = "Hello, I am Nova. I am here to support you.";

/// Synthesizes preview samples through the vendor TTS endpoint
pub struct PreviewSynth {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl PreviewSynth {
    /// Create a synthesizer from the live configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no API key is configured
    pub fn new(config: &LiveConfig) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: config.preview_model.clone(),
            api_key: config.api_key()?.clone(),
        })
    }

    /// Synthesize the sample sentence in the given prebuilt voice
    ///
    /// # Errors
    ///
    /// Returns `Error::Preview` if the endpoint rejects the request or the
    /// response carries no audio
    pub async fn synthesize(&self, voice_name: &str) -> Result<AudioChunk> {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Request<'a> {
            contents: Vec<RequestContent<'a>>,
            generation_config: serde_json::Value,
        }

        #[derive(serde::Serialize)]
        struct RequestContent<'a> {
            parts: Vec<RequestPart<'a>>,
        }

        #[derive(serde::Serialize)]
        struct RequestPart<'a> {
            text: &'a str,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(serde::Deserialize)]
        struct Candidate {
            content: Option<crate::live::protocol::Content>,
        }

        let request = Request {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: SAMPLE_TEXT }],
            }],
            generation_config: serde_json::json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice_name }
                    }
                }
            }),
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            self.api_key.expose_secret()
        );

        tracing::debug!(voice = voice_name, model = %self.model, "synthesizing preview");

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Preview(format!(
                "TTS endpoint error {status}: {body}"
            )));
        }

        let parsed: Response = response.json().await?;
        let payload = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or_else(|| Error::Preview("response carried no audio".to_string()))?;

        codec::decode_base64_chunk(&payload.data, PLAYBACK_SAMPLE_RATE, 1)
    }
}

/// Load a playable chunk for the given profile's preview
///
/// Custom profiles read their imported sample file; this is the one path
/// that honors a custom profile (the live session falls back to a prebuilt
/// voice).
///
/// # Errors
///
/// Returns `Error::Preview` if the sample file is missing or undecodable
pub fn load_custom_sample(profile: &VoiceProfile) -> Result<AudioChunk> {
    let VoiceProfile::Custom { sample_path, .. } = profile else {
        return Err(Error::Preview(
            "profile has no imported sample".to_string(),
        ));
    };
    load_sample_file(sample_path)
}

/// Decode a WAV or MP3 sample file to a mono chunk at the playback rate
///
/// # Errors
///
/// Returns `Error::Preview` on unsupported formats or decode failures
pub fn load_sample_file(path: &Path) -> Result<AudioChunk> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let (samples, sample_rate) = match extension.as_deref() {
        Some("wav") => read_wav(path)?,
        Some("mp3") => read_mp3(path)?,
        other => {
            return Err(Error::Preview(format!(
                "unsupported sample format {other:?} (expected wav or mp3)"
            )));
        }
    };

    Ok(AudioChunk {
        samples: resample_linear(&samples, sample_rate, PLAYBACK_SAMPLE_RATE),
        sample_rate: PLAYBACK_SAMPLE_RATE,
        channels: 1,
    })
}

/// Read a WAV file as mono f32 samples
fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| Error::Preview(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max = f32::from(i16::MAX);
            reader
                .samples::<i16>()
                .map(|s| s.map(|v| f32::from(v) / max))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Preview(e.to_string()))?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Preview(e.to_string()))?,
    };

    Ok((
        mix_to_mono(&samples, usize::from(spec.channels)),
        spec.sample_rate,
    ))
}

/// Read an MP3 file as mono f32 samples
fn read_mp3(path: &Path) -> Result<(Vec<f32>, u32)> {
    let data = std::fs::read(path)?;
    let mut decoder = minimp3::Decoder::new(std::io::Cursor::new(data));
    let mut samples = Vec::new();
    let mut sample_rate = PLAYBACK_SAMPLE_RATE;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                #[allow(clippy::cast_sign_loss)]
                {
                    sample_rate = frame.sample_rate.max(1) as u32;
                }
                let mono: Vec<f32> = frame
                    .data
                    .iter()
                    .map(|&s| f32::from(s) / 32768.0)
                    .collect();
                samples.extend(mix_to_mono(&mono, frame.channels.max(1)));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Preview(format!("MP3 decode error: {e}"))),
        }
    }

    Ok((samples, sample_rate))
}

/// Average interleaved channels down to mono
fn mix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    #[allow(clippy::cast_precision_loss)]
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resample
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn resample_linear(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(from) / f64::from(to);
    let out_len = ((samples.len() as f64) / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let position = i as f64 * ratio;
        let index = position as usize;
        let fraction = (position - index as f64) as f32;
        let current = samples[index.min(samples.len() - 1)];
        let next = samples[(index + 1).min(samples.len() - 1)];
        out.push(current + (next - current) * fraction);
    }

    out
}

/// Plays previews one at a time on a sink
pub struct VoicePreview<S> {
    sink: S,
    current: Option<SourceId>,
}

impl<S: AudioSink> VoicePreview<S> {
    /// Create a preview player over the given sink
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            current: None,
        }
    }

    /// Play a chunk now, cutting off any previous preview
    ///
    /// # Errors
    ///
    /// Returns error if the sink cannot start the chunk
    pub fn play(&mut self, chunk: AudioChunk) -> Result<SourceId> {
        self.stop();
        let at = self.sink.now();
        let id = self.sink.start(chunk, at)?;
        self.current = Some(id);
        Ok(id)
    }

    /// Stop the current preview, if any
    pub fn stop(&mut self) {
        if let Some(id) = self.current.take() {
            self.sink.stop(id);
        }
    }

    /// Whether a preview is still playing
    pub fn is_playing(&mut self) -> bool {
        if let Some(current) = self.current {
            if self.sink.finished().contains(&current) {
                self.current = None;
            }
        }
        self.current.is_some()
    }
}
