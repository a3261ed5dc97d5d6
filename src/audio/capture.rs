//! Microphone capture and frame encoding
//!
//! The cpal callback only appends samples to a shared buffer; slicing into
//! fixed frames and PCM encoding happen on the session loop so the audio
//! thread is never blocked.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::audio::codec;
use crate::{CAPTURE_FRAME_SAMPLES, CAPTURE_SAMPLE_RATE, Error, Result};

/// A live microphone source
///
/// `start` opens the hardware stream; `stop` releases it and is idempotent.
/// `take_samples` drains whatever the device produced since the last call.
pub trait CaptureSource {
    /// Open the hardware stream and begin capturing
    ///
    /// # Errors
    ///
    /// Returns `Error::Permission` if microphone access is denied and
    /// `Error::Unsupported` if no capture backend is available
    fn start(&mut self) -> Result<()>;

    /// Release the hardware stream
    fn stop(&mut self);

    /// Drain samples captured since the last call
    fn take_samples(&mut self) -> Vec<f32>;

    /// Sample rate the source captures at
    fn sample_rate(&self) -> u32;
}

/// Captures 16kHz mono audio from the default input device
pub struct CpalCapture {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl CpalCapture {
    /// Create a new capture source on the default input device
    ///
    /// # Errors
    ///
    /// Returns `Error::Unsupported` if no input device exists and
    /// `Error::Audio` if no 16kHz mono config is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Unsupported("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(CAPTURE_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(CAPTURE_SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable capture config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(CAPTURE_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = CAPTURE_SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }
}

impl CaptureSource for CpalCapture {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::DeviceNotAvailable => Error::Permission(
                    "input device not available (is microphone access allowed?)".to_string(),
                ),
                other => Error::Audio(other.to_string()),
            })?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            if let Ok(mut buf) = self.buffer.lock() {
                buf.clear();
            }
            tracing::debug!("audio capture stopped");
        }
    }

    fn take_samples(&mut self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    fn sample_rate(&self) -> u32 {
        CAPTURE_SAMPLE_RATE
    }
}

/// Slices a capture source into fixed encoded PCM frames
pub struct CapturePipeline<C> {
    source: C,
    pending: Vec<f32>,
    frame_samples: usize,
    running: bool,
}

impl<C: CaptureSource> CapturePipeline<C> {
    /// Create a pipeline with the standard frame size
    pub fn new(source: C) -> Self {
        Self::with_frame_size(source, CAPTURE_FRAME_SAMPLES)
    }

    /// Create a pipeline with an explicit frame size
    pub fn with_frame_size(source: C, frame_samples: usize) -> Self {
        Self {
            source,
            pending: Vec::new(),
            frame_samples,
            running: false,
        }
    }

    /// Start capturing; a no-op when already running
    ///
    /// # Errors
    ///
    /// Propagates the source's `Permission`/`Unsupported`/`Audio` errors
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        self.source.start()?;
        self.running = true;
        Ok(())
    }

    /// Stop capturing and discard partial frame data; idempotent
    pub fn stop(&mut self) {
        if self.running {
            self.source.stop();
            self.running = false;
        }
        self.pending.clear();
    }

    /// Whether the hardware stream is open
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Sample rate of the underlying source
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    /// Throw away everything captured so far
    ///
    /// Frames produced before the session handshake completes are dropped,
    /// not sent late.
    pub fn discard(&mut self) {
        self.source.take_samples();
        self.pending.clear();
    }

    /// Drain complete frames captured since the last call, PCM-encoded
    ///
    /// Leftover samples stay pending until the next full frame accumulates.
    pub fn poll_frames(&mut self) -> Vec<Vec<u8>> {
        if !self.running {
            return Vec::new();
        }

        self.pending.extend(self.source.take_samples());

        let mut frames = Vec::new();
        while self.pending.len() >= self.frame_samples {
            let rest = self.pending.split_off(self.frame_samples);
            let frame = std::mem::replace(&mut self.pending, rest);
            frames.push(codec::encode_frame(&frame));
        }

        frames
    }
}
