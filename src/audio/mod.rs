//! Audio pipeline
//!
//! Handles PCM encoding, microphone capture, playback scheduling, and the
//! speaker sink. The scheduler and capture pipeline are written against the
//! `AudioSink` / `CaptureSource` capability traits so they run under test
//! without audio hardware.

pub mod capture;
pub mod codec;
pub mod playback;
pub mod scheduler;

pub use capture::{CaptureSource, CapturePipeline, CpalCapture};
pub use codec::AudioChunk;
pub use playback::{AudioSink, CpalSink, SourceId};
pub use scheduler::PlaybackScheduler;
