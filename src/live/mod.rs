//! Live session transport
//!
//! One bidirectional message stream to the remote voice endpoint: encoded
//! audio frames go out, audio payloads / transcript fragments / turn and
//! interruption signals come back. The session state machine talks to the
//! [`LiveTransport`] trait; the real implementation is a WebSocket client.

pub mod protocol;
pub mod websocket;

use async_trait::async_trait;

use crate::Result;

pub use websocket::WsLive;

/// Configuration sent with the session handshake
#[derive(Debug, Clone)]
pub struct SessionSetup {
    /// Live model identifier
    pub model: String,
    /// Prebuilt voice name for spoken output
    pub voice: String,
    /// System instruction for the companion (content opaque to this crate)
    pub system_instruction: String,
}

/// An event received from the remote endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Transcript fragment of the current spoken turn
    Transcript(String),
    /// The current spoken turn finished
    TurnComplete,
    /// Base64 PCM audio payload at the playback rate
    Audio(String),
    /// The user started speaking over pending playback
    Interrupted,
    /// The remote closed the stream
    Closed,
}

/// Bidirectional stream to the remote voice endpoint
#[async_trait]
pub trait LiveTransport {
    /// Open the stream and complete the session handshake
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if the connection or handshake fails
    async fn connect(&mut self, setup: &SessionSetup) -> Result<()>;

    /// Send one encoded PCM capture frame
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if the stream is gone
    async fn send_audio(&mut self, pcm: &[u8]) -> Result<()>;

    /// Receive the next server event; `None` once the stream is exhausted
    async fn next_event(&mut self) -> Option<Result<ServerEvent>>;

    /// Close the stream; safe to call when never connected
    async fn close(&mut self);
}
