//! Audio playback sink
//!
//! The scheduler talks to an [`AudioSink`]: an output clock plus the ability
//! to start a chunk at a given clock time and cut sources off early. The real
//! implementation mixes scheduled chunks into a cpal output stream; tests use
//! an in-memory sink with a hand-advanced clock.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::audio::codec::AudioChunk;
use crate::{Error, PLAYBACK_SAMPLE_RATE, Result};

/// Handle to a scheduled playback source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// Construct a source id from a raw counter value
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Output clock plus scheduled chunk playback
///
/// `stop` is idempotent: stopping an unknown or already-finished source is a
/// no-op. `finished` drains the set of sources that completed on their own
/// since the last call.
pub trait AudioSink {
    /// Current output clock time in seconds
    fn now(&self) -> f64;

    /// Schedule a chunk to begin at `at` seconds on the output clock
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be started
    fn start(&mut self, chunk: AudioChunk, at: f64) -> Result<SourceId>;

    /// Cut a source off immediately
    fn stop(&mut self, id: SourceId);

    /// Drain sources that played to completion since the last call
    fn finished(&mut self) -> Vec<SourceId>;
}

/// A chunk mixed into the output stream
struct PlayingSource {
    id: SourceId,
    start_frame: u64,
    samples: Vec<f32>,
    position: usize,
}

/// State shared with the real-time output callback
struct SinkShared {
    sources: Vec<PlayingSource>,
    finished: Vec<SourceId>,
    frames_rendered: u64,
}

/// Plays scheduled chunks through the default output device
pub struct CpalSink {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    shared: Arc<Mutex<SinkShared>>,
    stream: Option<Stream>,
    next_id: u64,
}

impl CpalSink {
    /// Create a new playback sink on the default output device
    ///
    /// # Errors
    ///
    /// Returns `Error::Unsupported` if no output device is available and
    /// `Error::Audio` if no usable output config is found
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Unsupported("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback sink initialized"
        );

        Ok(Self {
            device,
            config,
            shared: Arc::new(Mutex::new(SinkShared {
                sources: Vec::new(),
                finished: Vec::new(),
                frames_rendered: 0,
            })),
            stream: None,
            next_id: 0,
        })
    }

    /// Build and start the output stream on first use
    fn ensure_stream(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mix_output(&shared, data, channels);
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio playback stream started");
        Ok(())
    }
}

impl AudioSink for CpalSink {
    #[allow(clippy::cast_precision_loss)]
    fn now(&self) -> f64 {
        let frames = self
            .shared
            .lock()
            .map(|s| s.frames_rendered)
            .unwrap_or_default();
        frames as f64 / f64::from(PLAYBACK_SAMPLE_RATE)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn start(&mut self, chunk: AudioChunk, at: f64) -> Result<SourceId> {
        self.ensure_stream()?;

        // Inbound chunks are mono at the playback rate; anything else was
        // rejected by the codec before reaching the sink.
        let id = SourceId(self.next_id);
        self.next_id += 1;

        let start_frame = (at.max(0.0) * f64::from(PLAYBACK_SAMPLE_RATE)).round() as u64;

        if let Ok(mut shared) = self.shared.lock() {
            shared.sources.push(PlayingSource {
                id,
                start_frame,
                samples: chunk.samples,
                position: 0,
            });
        }

        Ok(id)
    }

    fn stop(&mut self, id: SourceId) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.sources.retain(|s| s.id != id);
        }
    }

    fn finished(&mut self) -> Vec<SourceId> {
        self.shared
            .lock()
            .map(|mut s| std::mem::take(&mut s.finished))
            .unwrap_or_default()
    }
}

/// Mix all due sources into one output buffer
///
/// Runs on the real-time audio thread: appends nothing, only advances source
/// positions, flags completions, and bumps the frame clock.
fn mix_output(shared: &Arc<Mutex<SinkShared>>, data: &mut [f32], channels: usize) {
    let Ok(mut state) = shared.lock() else {
        data.fill(0.0);
        return;
    };

    for frame in data.chunks_mut(channels) {
        let clock = state.frames_rendered;
        let mut mixed = 0.0f32;

        for source in &mut state.sources {
            if source.start_frame <= clock && source.position < source.samples.len() {
                mixed += source.samples[source.position];
                source.position += 1;
            }
        }

        for out in frame.iter_mut() {
            *out = mixed.clamp(-1.0, 1.0);
        }

        state.frames_rendered += 1;
    }

    // Retire sources that played out
    let mut done = Vec::new();
    state.sources.retain(|s| {
        if s.position >= s.samples.len() {
            done.push(s.id);
            false
        } else {
            true
        }
    });
    state.finished.extend(done);
}
