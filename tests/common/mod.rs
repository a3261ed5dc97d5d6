//! Shared test utilities
//!
//! Fake capture source, playback sink, and transport so the audio core runs
//! without hardware or a network. The sink clock is advanced by hand.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use nova_voice::audio::{AudioSink, CaptureSource, SourceId};
use nova_voice::live::{LiveTransport, ServerEvent, SessionSetup};
use nova_voice::{AudioChunk, Error, PLAYBACK_SAMPLE_RATE, Result};

/// A chunk the fake sink was asked to start
#[derive(Debug, Clone)]
pub struct StartedChunk {
    pub id: SourceId,
    pub at: f64,
    pub duration: f64,
}

#[derive(Debug, Default)]
pub struct SinkInner {
    pub clock: f64,
    pub next_id: u64,
    pub started: Vec<StartedChunk>,
    pub stopped: Vec<SourceId>,
    pub completed: Vec<SourceId>,
}

/// In-memory sink with a hand-advanced clock
///
/// Clone the handle before moving it into a scheduler to keep control of the
/// clock and inspect scheduling from the test.
#[derive(Clone, Default)]
pub struct FakeSink {
    inner: Arc<Mutex<SinkInner>>,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_clock(&self, clock: f64) {
        self.inner.lock().unwrap().clock = clock;
    }

    /// Mark a source as played to completion
    pub fn complete(&self, id: SourceId) {
        self.inner.lock().unwrap().completed.push(id);
    }

    pub fn started(&self) -> Vec<StartedChunk> {
        self.inner.lock().unwrap().started.clone()
    }

    pub fn stopped(&self) -> Vec<SourceId> {
        self.inner.lock().unwrap().stopped.clone()
    }
}

impl AudioSink for FakeSink {
    fn now(&self) -> f64 {
        self.inner.lock().unwrap().clock
    }

    fn start(&mut self, chunk: AudioChunk, at: f64) -> Result<SourceId> {
        let mut inner = self.inner.lock().unwrap();
        let id = SourceId::from_raw(inner.next_id);
        inner.next_id += 1;
        inner.started.push(StartedChunk {
            id,
            at,
            duration: chunk.duration_secs(),
        });
        Ok(id)
    }

    fn stop(&mut self, id: SourceId) {
        self.inner.lock().unwrap().stopped.push(id);
    }

    fn finished(&mut self) -> Vec<SourceId> {
        std::mem::take(&mut self.inner.lock().unwrap().completed)
    }
}

/// How a fake capture source fails to open
#[derive(Debug, Clone, Copy)]
pub enum CaptureFailure {
    Permission,
    Unsupported,
}

#[derive(Debug, Default)]
pub struct CaptureInner {
    pub queue: VecDeque<Vec<f32>>,
    pub running: bool,
    pub fail_with: Option<CaptureFailure>,
    pub start_count: usize,
    pub stop_count: usize,
}

/// Scripted microphone source
#[derive(Clone, Default)]
pub struct FakeCapture {
    inner: Arc<Mutex<CaptureInner>>,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denied() -> Self {
        let capture = Self::default();
        capture.inner.lock().unwrap().fail_with = Some(CaptureFailure::Permission);
        capture
    }

    /// Queue samples for the next poll
    pub fn push_samples(&self, samples: Vec<f32>) {
        self.inner.lock().unwrap().queue.push_back(samples);
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().unwrap().running
    }

    pub fn start_count(&self) -> usize {
        self.inner.lock().unwrap().start_count
    }
}

impl CaptureSource for FakeCapture {
    fn start(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.fail_with {
            Some(CaptureFailure::Permission) => {
                Err(Error::Permission("microphone access denied".to_string()))
            }
            Some(CaptureFailure::Unsupported) => {
                Err(Error::Unsupported("no capture backend".to_string()))
            }
            None => {
                inner.running = true;
                inner.start_count += 1;
                Ok(())
            }
        }
    }

    fn stop(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.running = false;
        inner.stop_count += 1;
    }

    fn take_samples(&mut self) -> Vec<f32> {
        self.inner.lock().unwrap().queue.drain(..).flatten().collect()
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }
}

/// Scripted bidirectional stream
///
/// Serves the scripted events in order, then reports the stream as
/// exhausted. Records connect/close calls and every frame sent.
pub struct FakeTransport {
    pub events: VecDeque<Result<ServerEvent>>,
    pub fail_connect: bool,
    pub connect_count: usize,
    pub close_count: usize,
    pub sent_frames: Vec<Vec<u8>>,
    pub connected: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            fail_connect: false,
            connect_count: 0,
            close_count: 0,
            sent_frames: Vec::new(),
            connected: false,
        }
    }

    pub fn refusing() -> Self {
        let mut transport = Self::new();
        transport.fail_connect = true;
        transport
    }

    pub fn scripted(events: Vec<ServerEvent>) -> Self {
        let mut transport = Self::new();
        transport.events = events.into_iter().map(Ok).collect();
        transport
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiveTransport for FakeTransport {
    async fn connect(&mut self, _setup: &SessionSetup) -> Result<()> {
        self.connect_count += 1;
        if self.fail_connect {
            Err(Error::Connection("handshake refused".to_string()))
        } else {
            self.connected = true;
            Ok(())
        }
    }

    async fn send_audio(&mut self, pcm: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::Connection("not connected".to_string()));
        }
        self.sent_frames.push(pcm.to_vec());
        Ok(())
    }

    async fn next_event(&mut self) -> Option<Result<ServerEvent>> {
        self.events.pop_front()
    }

    async fn close(&mut self) {
        self.connected = false;
        self.close_count += 1;
    }
}

/// A silent chunk of the given duration at the playback rate
pub fn silent_chunk(duration_secs: f64) -> AudioChunk {
    let samples = (duration_secs * f64::from(PLAYBACK_SAMPLE_RATE)).round() as usize;
    AudioChunk {
        samples: vec![0.0; samples],
        sample_rate: PLAYBACK_SAMPLE_RATE,
        channels: 1,
    }
}

/// Base64 PCM payload of the given duration, as the endpoint would send it
pub fn audio_payload(duration_secs: f64) -> String {
    let chunk = silent_chunk(duration_secs);
    nova_voice::audio::codec::to_base64(&nova_voice::audio::codec::encode_frame(&chunk.samples))
}

/// A session setup for tests
pub fn test_setup() -> SessionSetup {
    SessionSetup {
        model: "models/test-live".to_string(),
        voice: "Zephyr".to_string(),
        system_instruction: "be kind".to_string(),
    }
}
