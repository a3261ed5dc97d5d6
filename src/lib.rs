//! Nova Voice - real-time voice session client for the Nova Care companion
//!
//! This library provides the core audio pipeline for a live voice session:
//! - PCM codec and playback scheduling
//! - Microphone capture and frame encoding
//! - The session state machine bridging both to a streaming AI endpoint
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    UI surface                        │
//! │      start / stop  │  session snapshot (watch)      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Voice session loop                     │
//! │   Capture ──► Codec ──► Live transport (WebSocket)  │
//! │   Scheduler ◄── Codec ◄── server events             │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │      Platform capabilities (cpal mic / speaker)      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduler, codec, and state machine are written against capability
//! traits (`CaptureSource`, `AudioSink`, `LiveTransport`) so the core logic
//! runs under test with a fake clock and in-memory sink, no audio hardware.

pub mod audio;
pub mod config;
pub mod error;
pub mod live;
pub mod preview;
pub mod prompt;
pub mod session;
pub mod voices;

pub use audio::codec::AudioChunk;
pub use audio::scheduler::PlaybackScheduler;
pub use audio::{AudioSink, CaptureSource, SourceId};
pub use config::Config;
pub use error::{Error, Result};
pub use live::{LiveTransport, ServerEvent, SessionSetup};
pub use session::{SessionSnapshot, SessionState, VoiceSession};
pub use voices::VoiceProfile;

/// Sample rate for microphone capture (16kHz for speech input)
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Sample rate for session playback (matches the live endpoint's output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Samples per captured frame (one processing quantum)
pub const CAPTURE_FRAME_SAMPLES: usize = 4096;
