//! Voice session state machine
//!
//! Owns the lifecycle of one live voice session: microphone capture feeding
//! the transport, inbound events feeding the playback scheduler and the
//! transcript, and deterministic teardown on stop, error, or remote close.
//!
//! All state is touched from the single session loop; capture frames and
//! inbound events interleave but never run concurrently.

pub mod transcript;

use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

use crate::audio::capture::{CapturePipeline, CaptureSource};
use crate::audio::codec;
use crate::audio::playback::AudioSink;
use crate::audio::scheduler::PlaybackScheduler;
use crate::live::{LiveTransport, ServerEvent, SessionSetup};
use crate::{Error, PLAYBACK_SAMPLE_RATE, Result};

pub use transcript::TranscriptBuffer;

/// How often the loop drains capture frames while waiting on the transport
const CAPTURE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle of one voice session
///
/// `Closed` is terminal; a new session is always a fresh construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started
    Idle,
    /// Microphone open, handshake in flight
    Connecting,
    /// Streaming in both directions
    Active,
    /// Flushing playback after the user spoke over it
    Interrupted,
    /// Torn down
    Closed,
}

/// Observable session state for the UI boundary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// A live session is running
    pub is_active: bool,
    /// The microphone is streaming to the session
    pub is_listening: bool,
    /// Transcript of the current spoken turn
    pub transcription: String,
    /// Last user-visible failure, if any
    pub error: Option<String>,
}

/// One live voice session
///
/// Generic over the capture source, playback sink, and transport so the
/// state machine runs under test with fakes and a hand-advanced clock.
pub struct VoiceSession<C, S, T> {
    id: Uuid,
    state: SessionState,
    capture: CapturePipeline<C>,
    scheduler: PlaybackScheduler<S>,
    transport: T,
    transcript: TranscriptBuffer,
    setup: SessionSetup,
    last_error: Option<String>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl<C, S, T> VoiceSession<C, S, T>
where
    C: CaptureSource,
    S: AudioSink,
    T: LiveTransport,
{
    /// Create a session from its composed parts
    pub fn new(
        capture: CapturePipeline<C>,
        scheduler: PlaybackScheduler<S>,
        transport: T,
        setup: SessionSetup,
    ) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            capture,
            scheduler,
            transport,
            transcript: TranscriptBuffer::new(),
            setup,
            last_error: None,
            snapshot,
        }
    }

    /// Unique identifier of this session
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to session state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current observable snapshot
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// The playback scheduler (for diagnostics and tests)
    pub const fn scheduler(&self) -> &PlaybackScheduler<S> {
        &self.scheduler
    }

    /// The transport (for diagnostics and tests)
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Open the microphone and establish the live session
    ///
    /// On success the session is `Active` and listening. Capture frames
    /// produced before the handshake completed are discarded.
    ///
    /// # Errors
    ///
    /// - `Error::Permission` / `Error::Unsupported` if the microphone cannot
    ///   be opened; the session stays `Idle` and holds no capture stream
    /// - `Error::Connection` if the handshake fails; the session is `Closed`
    ///   and all resources are released
    /// - `Error::Voice` if the session is already running or was closed
    pub async fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Closed => {
                return Err(Error::Voice(
                    "session is closed; construct a new one".to_string(),
                ));
            }
            _ => return Err(Error::Voice("session already active".to_string())),
        }

        if let Err(e) = self.capture.start() {
            self.last_error = Some(e.to_string());
            self.publish();
            return Err(e);
        }

        self.state = SessionState::Connecting;
        self.publish();

        if let Err(e) = self.transport.connect(&self.setup).await {
            self.capture.stop();
            self.state = SessionState::Closed;
            self.last_error = Some(e.to_string());
            self.publish();
            return Err(e);
        }

        self.capture.discard();
        self.state = SessionState::Active;
        self.last_error = None;
        self.publish();

        tracing::info!(session = %self.id, voice = %self.setup.voice, "voice session active");
        Ok(())
    }

    /// Drive the session until it closes
    ///
    /// Interleaves inbound events with capture polling on one loop; returns
    /// once the session reaches `Closed` (user stop is signalled by dropping
    /// this future and calling [`stop`](Self::stop)).
    ///
    /// # Errors
    ///
    /// Returns `Error::Voice` if the session was never started
    pub async fn run(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Active | SessionState::Interrupted) {
            return Err(Error::Voice("session not started".to_string()));
        }

        while self.state != SessionState::Closed {
            self.scheduler.reap();

            if let Err(e) = self.forward_frames().await {
                self.fail(&e).await;
                break;
            }

            match tokio::time::timeout(CAPTURE_POLL_INTERVAL, self.transport.next_event()).await
            {
                Ok(Some(Ok(event))) => self.handle_event(event).await,
                Ok(Some(Err(e))) => self.fail(&e).await,
                Ok(None) => self.stop().await,
                Err(_) => {} // poll capture again
            }
        }

        Ok(())
    }

    /// Send every complete capture frame to the transport
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if the transport rejects a frame
    pub async fn forward_frames(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Active | SessionState::Interrupted) {
            return Ok(());
        }

        for frame in self.capture.poll_frames() {
            self.transport.send_audio(&frame).await?;
        }
        Ok(())
    }

    /// Apply one inbound server event
    pub async fn handle_event(&mut self, event: ServerEvent) {
        if !matches!(self.state, SessionState::Active | SessionState::Interrupted) {
            tracing::debug!(?event, "dropping event outside active session");
            return;
        }

        match event {
            ServerEvent::Transcript(fragment) => {
                self.transcript.push(&fragment);
                self.publish();
            }
            ServerEvent::TurnComplete => {
                self.transcript.clear();
                self.publish();
            }
            ServerEvent::Audio(payload) => {
                match codec::decode_base64_chunk(&payload, PLAYBACK_SAMPLE_RATE, 1) {
                    Ok(chunk) => {
                        if let Err(e) = self.scheduler.enqueue(chunk) {
                            tracing::warn!(error = %e, "failed to schedule audio chunk");
                        }
                    }
                    // A malformed chunk is skipped; it never ends the session
                    Err(e) => tracing::warn!(error = %e, "dropping malformed audio payload"),
                }
            }
            ServerEvent::Interrupted => {
                self.state = SessionState::Interrupted;
                self.scheduler.interrupt();
                self.transcript.clear();
                tracing::debug!("playback flushed on interruption");
                self.state = SessionState::Active;
                self.publish();
            }
            ServerEvent::Closed => {
                tracing::info!("live session closed by remote");
                self.stop().await;
            }
        }
    }

    /// Tear the session down
    ///
    /// Closes the transport, releases the microphone, cuts all playback, and
    /// clears the transcript. Idempotent, and safe to call on a session that
    /// never started (which stays `Idle`).
    pub async fn stop(&mut self) {
        match self.state {
            SessionState::Idle | SessionState::Closed => return,
            _ => {}
        }

        self.transport.close().await;
        self.capture.stop();
        self.scheduler.teardown();
        self.transcript.clear();
        self.state = SessionState::Closed;
        self.publish();

        tracing::info!(session = %self.id, "voice session closed");
    }

    /// Record a fatal transport failure and tear down
    async fn fail(&mut self, error: &Error) {
        tracing::error!(error = %error, "live session failed");
        self.last_error = Some(error.to_string());
        self.stop().await;
    }

    /// Publish the current observable state
    fn publish(&self) {
        let active = matches!(self.state, SessionState::Active | SessionState::Interrupted);
        self.snapshot.send_replace(SessionSnapshot {
            is_active: active,
            is_listening: active,
            transcription: self.transcript.as_str().to_string(),
            error: self.last_error.clone(),
        });
    }
}
